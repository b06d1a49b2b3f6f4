use std::{collections::HashMap, iter::Peekable, str::Chars};

use crate::ExprError::{self, *};

/// Evaluate an integer arithmetic expression.
///
/// Supported syntax: decimal and `0x` hex literals, identifiers bound through
/// `vars`, `+ - * / %`, unary minus, and parentheses. Division truncates
/// toward zero.
pub fn evaluate(source: &str, vars: &HashMap<String, i64>) -> Result<i64, ExprError> {
    Evaluator::new(source, vars).evaluate()
}

struct Evaluator<'s> {
    chars: Peekable<Chars<'s>>,
    vars: &'s HashMap<String, i64>,
}

impl<'s> Evaluator<'s> {
    fn new(source: &'s str, vars: &'s HashMap<String, i64>) -> Self {
        Evaluator {
            chars: source.chars().peekable(),
            vars,
        }
    }

    fn evaluate(mut self) -> Result<i64, ExprError> {
        self.skip_whitespace();
        let value = self.sum()?;
        if self.chars.peek().is_some() {
            return Err(self.expected("end of expression"));
        }
        Ok(value)
    }

    fn sum(&mut self) -> Result<i64, ExprError> {
        let mut value = self.product()?;
        while let Some(&op) = self.chars.peek().filter(|&&c| c == '+' || c == '-') {
            self.chars.next();
            self.skip_whitespace();
            let rhs = self.product()?;
            value = match op {
                '+' => value.wrapping_add(rhs),
                _ => value.wrapping_sub(rhs),
            };
        }
        Ok(value)
    }

    fn product(&mut self) -> Result<i64, ExprError> {
        let mut value = self.unary()?;
        while let Some(&op) = self
            .chars
            .peek()
            .filter(|&&c| c == '*' || c == '/' || c == '%')
        {
            self.chars.next();
            self.skip_whitespace();
            let rhs = self.unary()?;
            value = match op {
                '*' => value.wrapping_mul(rhs),
                _ => {
                    if rhs == 0 {
                        return Err(DivideByZero);
                    }
                    if op == '/' {
                        value / rhs
                    } else {
                        value % rhs
                    }
                }
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<i64, ExprError> {
        if self.chars.peek() == Some(&'-') {
            self.chars.next();
            self.skip_whitespace();
            return Ok(self.unary()?.wrapping_neg());
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<i64, ExprError> {
        match self.chars.peek() {
            Some('(') => {
                self.chars.next();
                self.skip_whitespace();
                let value = self.sum()?;
                if self.chars.next() != Some(')') {
                    return Err(SyntaxError("unclosed parenthesis".to_string()));
                }
                self.skip_whitespace();
                Ok(value)
            }
            Some(&c) if c.is_ascii_digit() => self.number(),
            Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
                let name = self.name();
                match self.vars.get(&name) {
                    Some(&value) => Ok(value),
                    None => Err(UndefinedVariable(name)),
                }
            }
            _ => Err(self.expected("a number, variable, or `(`")),
        }
    }

    fn number(&mut self) -> Result<i64, ExprError> {
        if self.chars.peek() == Some(&'0') {
            self.chars.next();
            if self.chars.peek() == Some(&'x') || self.chars.peek() == Some(&'X') {
                self.chars.next();
                return self.hex_number();
            }
            return self.decimal_number(true);
        }
        self.decimal_number(false)
    }

    fn decimal_number(&mut self, zero_prefix: bool) -> Result<i64, ExprError> {
        let mut digits = String::new();
        if zero_prefix {
            digits.push('0');
        }

        while let Some(&c) = self.chars.peek().filter(|&&c| c.is_ascii_digit()) {
            digits.push(c);
            self.chars.next();
        }

        let value = digits
            .parse()
            .map_err(|_| SyntaxError(format!("integer out of range: {}", digits)))?;

        self.skip_whitespace();
        Ok(value)
    }

    fn hex_number(&mut self) -> Result<i64, ExprError> {
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek().filter(|&&c| c.is_ascii_hexdigit()) {
            digits.push(c);
            self.chars.next();
        }

        if digits.is_empty() {
            return Err(self.expected("a hex integer"));
        }

        let value = i64::from_str_radix(&digits, 16)
            .map_err(|_| SyntaxError(format!("integer out of range: 0x{}", digits)))?;

        self.skip_whitespace();
        Ok(value)
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(&c) = self
            .chars
            .peek()
            .filter(|&&c| c.is_ascii_alphanumeric() || c == '_')
        {
            name.push(c);
            self.chars.next();
        }
        self.skip_whitespace();
        name
    }

    fn skip_whitespace(&mut self) {
        while self
            .chars
            .peek()
            .filter(|c| c.is_ascii_whitespace())
            .is_some()
        {
            self.chars.next();
        }
    }

    fn expected(&mut self, expected: &str) -> ExprError {
        match self.chars.peek() {
            Some(c) => SyntaxError(format!("expected {}, found `{}`", expected, c)),
            None => SyntaxError(format!("expected {}, reached end of expression", expected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Result<i64, ExprError> {
        evaluate(source, &HashMap::new())
    }

    #[test]
    fn literals() {
        assert_eq!(eval("42"), Ok(42));
        assert_eq!(eval("0"), Ok(0));
        assert_eq!(eval("0x1F"), Ok(31));
        assert_eq!(eval("  7 "), Ok(7));
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("2 + 3 * 4"), Ok(14));
        assert_eq!(eval("(2 + 3) * 4"), Ok(20));
        assert_eq!(eval("10 - 4 - 3"), Ok(3));
        assert_eq!(eval("7 / 2"), Ok(3));
        assert_eq!(eval("7 % 2"), Ok(1));
    }

    #[test]
    fn unary_minus() {
        assert_eq!(eval("-5"), Ok(-5));
        assert_eq!(eval("3 + -2"), Ok(1));
        assert_eq!(eval("--4"), Ok(4));
    }

    #[test]
    fn variables() {
        let mut vars = HashMap::new();
        vars.insert("ARG_00".to_string(), 3);
        vars.insert("ARG_01".to_string(), 10);
        assert_eq!(evaluate("ARG_00 * 2", &vars), Ok(6));
        assert_eq!(evaluate("ARG_00 + ARG_01", &vars), Ok(13));
        assert_eq!(
            evaluate("ARG_02", &vars),
            Err(UndefinedVariable("ARG_02".to_string()))
        );
    }

    #[test]
    fn divide_by_zero() {
        assert_eq!(eval("1 / 0"), Err(DivideByZero));
        assert_eq!(eval("1 % 0"), Err(DivideByZero));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(eval(""), Err(SyntaxError(_))));
        assert!(matches!(eval("1 +"), Err(SyntaxError(_))));
        assert!(matches!(eval("(1"), Err(SyntaxError(_))));
        assert!(matches!(eval("1 2"), Err(SyntaxError(_))));
        assert!(matches!(eval("0x"), Err(SyntaxError(_))));
    }
}
