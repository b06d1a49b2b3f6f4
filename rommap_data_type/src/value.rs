//! Dynamically typed values produced by decoding bytes against a schema.

use std::fmt;

use indexmap::IndexMap;

use crate::ValueTypeError;

/// An integer value.
///
/// i128 is used so that any integer width the validator accepts fits in it.
pub type IntValue = i128;

/// A dynamically typed value decoded from a byte source.
///
/// Values are produced only by the decode engine, never authored by hand.
/// A value owns its payload and holds no reference back to the byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// An integer, accumulated byte by byte in stream order.
    Int(IntValue),
    /// Raw bytes (script text, assembly, tiles, unknown data).
    Bytes(Vec<u8>),
    /// A struct value, keyed by member name in decode order.
    Struct(Box<IndexMap<String, Value>>),
    /// An array value.
    Array(Vec<Value>),
}

/// A decoded value together with the number of bytes consumed producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The decoded value tree.
    pub value: Value,
    /// How many bytes the decode consumed, including any terminator.
    pub size: usize,
}

impl Value {
    /// Return true if the value is an integer.
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// Convert the value to an int, panicking if it is not an int.
    #[track_caller]
    pub fn as_int(&self) -> IntValue {
        match self.try_as_int() {
            Ok(n) => n,
            Err(error) => panic!("{}", error),
        }
    }

    /// Convert the value to an int.
    pub fn try_as_int(&self) -> Result<IntValue, ValueTypeError> {
        if let Value::Int(n) = *self {
            Ok(n)
        } else {
            Err(ValueTypeError {
                expected: "int".into(),
                actual: self.clone(),
            })
        }
    }

    /// Convert the value to raw bytes, panicking on failure.
    #[track_caller]
    pub fn as_bytes(&self) -> &[u8] {
        match self.try_as_bytes() {
            Ok(bytes) => bytes,
            Err(error) => panic!("{}", error),
        }
    }

    /// Convert the value to raw bytes.
    pub fn try_as_bytes(&self) -> Result<&[u8], ValueTypeError> {
        if let Value::Bytes(bytes) = self {
            Ok(bytes)
        } else {
            Err(ValueTypeError {
                expected: "bytes".into(),
                actual: self.clone(),
            })
        }
    }

    /// Convert the value to a struct and return its members, panicking on
    /// failure.
    #[track_caller]
    pub fn as_struct(&self) -> &IndexMap<String, Value> {
        match self.try_as_struct() {
            Ok(fields) => fields,
            Err(error) => panic!("{}", error),
        }
    }

    /// Convert the value to a struct and return its members.
    pub fn try_as_struct(&self) -> Result<&IndexMap<String, Value>, ValueTypeError> {
        if let Value::Struct(fields) = self {
            Ok(fields)
        } else {
            Err(ValueTypeError {
                expected: "struct".into(),
                actual: self.clone(),
            })
        }
    }

    /// Convert the value to an array and return its elements, panicking on
    /// failure.
    #[track_caller]
    pub fn as_array(&self) -> &[Value] {
        match self.try_as_array() {
            Ok(elements) => elements,
            Err(error) => panic!("{}", error),
        }
    }

    /// Convert the value to an array and return its elements.
    pub fn try_as_array(&self) -> Result<&[Value], ValueTypeError> {
        if let Value::Array(elements) = self {
            Ok(elements)
        } else {
            Err(ValueTypeError {
                expected: "array".into(),
                actual: self.clone(),
            })
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bytes(bytes) => {
                write!(f, "[")?;
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{:02X}", byte)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(
                    f,
                    "{{ {} }}",
                    fields
                        .iter()
                        .map(|(name, value)| format!("{} = {}", name, value))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Value::Array(elements) => {
                write!(
                    f,
                    "[{}]",
                    elements
                        .iter()
                        .map(|element| format!("{}", element))
                        .collect::<Vec<String>>()
                        .join(", ")
                )
            }
        }
    }
}

macro_rules! value_from_int {
    ($ty:ty) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::Int(v.into())
            }
        }
    };
}

value_from_int!(i8);
value_from_int!(u8);
value_from_int!(i16);
value_from_int!(u16);
value_from_int!(i32);
value_from_int!(u32);
value_from_int!(i64);
value_from_int!(u64);
value_from_int!(i128);
