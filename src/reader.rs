// ABOUTME: Reader turning surface syntax from a port into values

use crate::error::Error;
use crate::port::Port;
use crate::value::{SymbolTable, Value, SYMBOL_NAME_MAX};
use std::cell::RefCell;
use std::rc::Rc;

/// Read one expression from `port`. `Ok(None)` means the port was cleanly
/// exhausted before any token; EOF anywhere inside an expression is a parse
/// error with a position-specific message.
pub fn read(
    port: &Rc<RefCell<Port>>,
    symbols: &mut SymbolTable,
) -> Result<Option<Value>, Error> {
    let mut reader = Reader { port, symbols };
    match reader.next_token_char()? {
        None => Ok(None),
        Some(ch) => {
            reader.ungetc(ch);
            reader.read_expr().map(Some)
        }
    }
}

/// Outcome of reading one escape-aware literal character.
enum Lit {
    Byte(u8),
    End,
    Eof,
}

struct Reader<'a> {
    port: &'a Rc<RefCell<Port>>,
    symbols: &'a mut SymbolTable,
}

impl Reader<'_> {
    fn getc(&mut self) -> Result<Option<u8>, Error> {
        Ok(self.port.borrow_mut().getc()?)
    }

    fn ungetc(&mut self, byte: u8) {
        self.port.borrow_mut().ungetc(byte);
    }

    /// Next byte that can start a token: skips whitespace and `;` comments.
    fn next_token_char(&mut self) -> Result<Option<u8>, Error> {
        loop {
            match self.getc()? {
                None => return Ok(None),
                Some(ch) if ch.is_ascii_whitespace() => {}
                Some(b';') => loop {
                    match self.getc()? {
                        None => return Ok(None),
                        Some(b'\n') => break,
                        Some(_) => {}
                    }
                },
                Some(ch) => return Ok(Some(ch)),
            }
        }
    }

    fn read_expr(&mut self) -> Result<Value, Error> {
        let ch = match self.next_token_char()? {
            None => {
                return Err(Error::parse(
                    "unexpected EOF where an expression is expected.",
                ));
            }
            Some(ch) => ch,
        };

        match ch {
            b')' => Err(Error::parse("too many ')' in expression.")),
            b']' => Err(Error::parse("too many ']' in expression.")),

            b'\'' => {
                let quoted = self.read_expr()?;
                let quote = self.symbols.intern("quote");
                Ok(Value::list(vec![quote, quoted]))
            }

            b',' => {
                let form = self.read_expr()?;
                let eval = self.symbols.intern("eval");
                Ok(Value::list(vec![eval, form]))
            }

            b'?' => match self.literal_char(None)? {
                Lit::Byte(b) => Ok(Value::Char(b)),
                Lit::Eof => Err(Error::parse("unexpected EOF after ?.")),
                Lit::End => unreachable!("no end character requested"),
            },

            b'(' => self.read_list(),
            b'[' => self.read_array(),
            b'"' => self.read_string(),

            b'0'..=b'9' | b'.' => self.read_number(ch),

            b'+' | b'-' => match self.getc()? {
                Some(next) if next.is_ascii_digit() || next == b'.' => {
                    let number = self.read_number(next)?;
                    if ch == b'+' {
                        return Ok(number);
                    }
                    match number {
                        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        _ => Err(Error::internal("unexpected non-number value after '-'.")),
                    }
                }
                next => {
                    if let Some(next) = next {
                        self.ungetc(next);
                    }
                    self.read_symbol(ch)
                }
            },

            _ => self.read_symbol(ch),
        }
    }

    fn read_list(&mut self) -> Result<Value, Error> {
        let ch = match self.next_token_char()? {
            None => return Err(Error::parse("unexpected EOF in a list.")),
            Some(ch) => ch,
        };
        if ch == b')' {
            return Ok(Value::Nil);
        }
        self.ungetc(ch);

        let head = Value::cons(self.read_expr()?, Value::Nil);
        let mut last = head.clone();
        loop {
            match self.next_token_char()? {
                None => return Err(Error::parse("unexpected EOF in a list.")),
                Some(b')') => return Ok(head),
                Some(b'.') => {
                    last.set_cdr(self.read_expr()?);
                    match self.next_token_char()? {
                        Some(b')') => return Ok(head),
                        _ => return Err(Error::parse("more than one elements after dot.")),
                    }
                }
                Some(ch) => {
                    self.ungetc(ch);
                    let node = Value::cons(self.read_expr()?, Value::Nil);
                    last.set_cdr(node.clone());
                    last = node;
                }
            }
        }
    }

    fn read_array(&mut self) -> Result<Value, Error> {
        let mut slots = Vec::new();
        loop {
            match self.next_token_char()? {
                None => return Err(Error::parse("unexpected EOF in an array literal.")),
                Some(b']') => return Ok(Value::array(slots)),
                Some(ch) => {
                    self.ungetc(ch);
                    slots.push(self.read_expr()?);
                }
            }
        }
    }

    fn read_string(&mut self) -> Result<Value, Error> {
        let mut bytes = Vec::new();
        loop {
            match self.literal_char(Some(b'"'))? {
                Lit::End => return Ok(Value::string(bytes)),
                Lit::Byte(b) => bytes.push(b),
                Lit::Eof => return Err(Error::parse("unexpected EOF in a string literal.")),
            }
        }
    }

    /// One character with the shared escape grammar. `endchar` (the closing
    /// quote for strings) yields `Lit::End`.
    fn literal_char(&mut self, endchar: Option<u8>) -> Result<Lit, Error> {
        let ch = match self.getc()? {
            None => return Ok(Lit::Eof),
            Some(ch) => ch,
        };
        if Some(ch) == endchar {
            return Ok(Lit::End);
        }
        if ch != b'\\' {
            return Ok(Lit::Byte(ch));
        }

        let esc = match self.getc()? {
            None => return Ok(Lit::Eof),
            Some(esc) => esc,
        };
        match esc {
            b'0'..=b'7' => {
                let mut value = esc - b'0';
                for _ in 0..2 {
                    match self.getc()? {
                        Some(d @ b'0'..=b'7') => {
                            value = value.wrapping_mul(8).wrapping_add(d - b'0');
                        }
                        Some(other) => {
                            self.ungetc(other);
                            break;
                        }
                        None => break,
                    }
                }
                Ok(Lit::Byte(value))
            }
            b'x' => {
                let mut value: u8 = 0;
                for _ in 0..2 {
                    match self.getc()? {
                        Some(d @ b'0'..=b'9') => {
                            value = value.wrapping_mul(16).wrapping_add(d - b'0');
                        }
                        Some(d @ b'a'..=b'f') => {
                            value = value.wrapping_mul(16).wrapping_add(d - b'a' + 10);
                        }
                        Some(d @ b'A'..=b'F') => {
                            value = value.wrapping_mul(16).wrapping_add(d - b'A' + 10);
                        }
                        Some(other) => {
                            self.ungetc(other);
                            break;
                        }
                        None => break,
                    }
                }
                Ok(Lit::Byte(value))
            }
            b'a' => Ok(Lit::Byte(0x07)),
            b'b' => Ok(Lit::Byte(0x08)),
            b'f' => Ok(Lit::Byte(0x0c)),
            b'n' => Ok(Lit::Byte(b'\n')),
            b'r' => Ok(Lit::Byte(b'\r')),
            b't' => Ok(Lit::Byte(b'\t')),
            b'v' => Ok(Lit::Byte(0x0b)),
            b'\\' => Ok(Lit::Byte(b'\\')),
            b'"' => Ok(Lit::Byte(b'"')),
            _ => Err(Error::parse("invalid escape sequence.")),
        }
    }

    /// Integer or float starting at `first`. `.` introduces a fraction and
    /// `e` a positive decimal exponent; an exponent without a fraction keeps
    /// the integer variant.
    fn read_number(&mut self, first: u8) -> Result<Value, Error> {
        let mut ch = Some(first);
        let mut int_part: i32 = 0;
        while let Some(d @ b'0'..=b'9') = ch {
            int_part = int_part.wrapping_mul(10).wrapping_add((d - b'0') as i32);
            ch = self.getc()?;
        }

        if ch == Some(b'.') {
            let mut frac: f64 = 0.0;
            let mut scale: f64 = 1.0;
            ch = self.getc()?;
            while let Some(d @ b'0'..=b'9') = ch {
                frac = frac * 10.0 + f64::from(d - b'0');
                scale *= 10.0;
                ch = self.getc()?;
            }
            let mut value = int_part as f64 + frac / scale;

            if ch == Some(b'e') {
                let exp = self.read_exponent(&mut ch)?;
                value *= 10f64.powi(exp);
            }
            if let Some(ch) = ch {
                self.ungetc(ch);
            }
            return Ok(Value::Float(value));
        }

        if ch == Some(b'e') {
            let exp = self.read_exponent(&mut ch)?;
            for _ in 0..exp {
                int_part = int_part.wrapping_mul(10);
            }
        }
        if let Some(ch) = ch {
            self.ungetc(ch);
        }
        Ok(Value::Int(int_part))
    }

    fn read_exponent(&mut self, ch: &mut Option<u8>) -> Result<i32, Error> {
        let mut exp: i32 = 0;
        *ch = self.getc()?;
        while let Some(d @ b'0'..=b'9') = *ch {
            exp = exp.wrapping_mul(10).wrapping_add((d - b'0') as i32);
            *ch = self.getc()?;
        }
        Ok(exp)
    }

    fn read_symbol(&mut self, first: u8) -> Result<Value, Error> {
        let mut name = vec![first];
        loop {
            match self.getc()? {
                None => break,
                Some(ch) if ch.is_ascii_whitespace() || b"()[]\";".contains(&ch) => {
                    self.ungetc(ch);
                    break;
                }
                Some(ch) => {
                    if name.len() == SYMBOL_NAME_MAX {
                        return Err(Error::parse("too long symbol name given."));
                    }
                    name.push(ch);
                }
            }
        }
        let name = String::from_utf8_lossy(&name).into_owned();
        Ok(self.symbols.intern(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(source: &str) -> Vec<Value> {
        let mut symbols = SymbolTable::new();
        read_all_with(source, &mut symbols)
    }

    fn read_all_with(source: &str, symbols: &mut SymbolTable) -> Vec<Value> {
        let port = Rc::new(RefCell::new(Port::from_str(source)));
        let mut out = Vec::new();
        while let Some(v) = read(&port, symbols).expect("parse failure") {
            out.push(v);
        }
        out
    }

    fn read_one(source: &str) -> Value {
        read_all(source).into_iter().next().expect("no expression")
    }

    fn read_err(source: &str) -> Error {
        let mut symbols = SymbolTable::new();
        let port = Rc::new(RefCell::new(Port::from_str(source)));
        read(&port, &mut symbols).expect_err("expected parse failure")
    }

    #[test]
    fn test_read_integers() {
        assert!(matches!(read_one("42"), Value::Int(42)));
        assert!(matches!(read_one("-42"), Value::Int(-42)));
        assert!(matches!(read_one("+7"), Value::Int(7)));
        assert!(matches!(read_one("0"), Value::Int(0)));
    }

    #[test]
    fn test_read_integer_exponent() {
        assert!(matches!(read_one("2e3"), Value::Int(2000)));
    }

    #[test]
    fn test_read_floats() {
        assert!(matches!(read_one("2.5"), Value::Float(x) if (x - 2.5).abs() < 1e-9));
        assert!(matches!(read_one(".5"), Value::Float(x) if (x - 0.5).abs() < 1e-9));
        assert!(matches!(read_one("-.5"), Value::Float(x) if (x + 0.5).abs() < 1e-9));
        assert!(matches!(read_one("1.05"), Value::Float(x) if (x - 1.05).abs() < 1e-9));
        assert!(matches!(read_one("1.5e2"), Value::Float(x) if (x - 150.0).abs() < 1e-9));
    }

    #[test]
    fn test_read_symbols() {
        assert_eq!(format!("{}", read_one("foo-bar")), "foo-bar");
        assert_eq!(format!("{}", read_one("+")), "+");
        assert_eq!(format!("{}", read_one("set-ports")), "set-ports");
    }

    #[test]
    fn test_read_interns_symbols() {
        let mut symbols = SymbolTable::new();
        let values = read_all_with("foo foo", &mut symbols);
        assert!(values[0].identical(&values[1]));
    }

    #[test]
    fn test_read_chars() {
        assert!(matches!(read_one("?b"), Value::Char(b'b')));
        assert!(matches!(read_one("?\\n"), Value::Char(b'\n')));
        assert!(matches!(read_one("?\\x41"), Value::Char(0x41)));
        assert!(matches!(read_one("?\\101"), Value::Char(0o101)));
    }

    #[test]
    fn test_read_strings() {
        assert_eq!(format!("{}", read_one("\"hello\"")), "\"hello\"");
        assert_eq!(format!("{}", read_one("\"\"")), "\"\"");
        let v = read_one("\"a\\tb\"");
        assert_eq!(v.string_bytes().unwrap(), b"a\tb");
        let v = read_one("\"\\x41\\102\"");
        assert_eq!(v.string_bytes().unwrap(), b"AB");
    }

    #[test]
    fn test_read_lists() {
        assert_eq!(format!("{}", read_one("(1 2 3)")), "(1 2 3)");
        assert!(read_one("()").is_nil());
        assert_eq!(format!("{}", read_one("(1 (2 3) 4)")), "(1 (2 3) 4)");
    }

    #[test]
    fn test_read_dotted() {
        assert_eq!(format!("{}", read_one("(1 . 2)")), "(1 . 2)");
        assert_eq!(format!("{}", read_one("(1 2 . 3)")), "(1 2 . 3)");
    }

    #[test]
    fn test_read_arrays() {
        assert_eq!(format!("{}", read_one("[1 2 3]")), "[1 2 3]");
        assert_eq!(format!("{}", read_one("[]")), "[]");
    }

    #[test]
    fn test_quote_and_eval_rewrites() {
        assert_eq!(format!("{}", read_one("'x")), "(quote x)");
        assert_eq!(format!("{}", read_one("'(1 2)")), "(quote (1 2))");
        assert_eq!(format!("{}", read_one(",x")), "(eval x)");
    }

    #[test]
    fn test_comments_skipped() {
        assert!(matches!(read_one("; comment\n42"), Value::Int(42)));
        assert_eq!(format!("{}", read_one("(1 ; two\n 2)")), "(1 2)");
    }

    #[test]
    fn test_clean_eof() {
        let mut symbols = SymbolTable::new();
        let port = Rc::new(RefCell::new(Port::from_str("   ; just a comment")));
        assert!(read(&port, &mut symbols).unwrap().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(read_err(")").to_string().contains("too many ')'"));
        assert!(read_err("]").to_string().contains("too many ']'"));
        assert!(read_err("(1 2").to_string().contains("EOF in a list"));
        assert!(read_err("[1").to_string().contains("EOF in an array"));
        assert!(read_err("\"abc").to_string().contains("EOF in a string"));
        assert!(read_err("\"a\\qb\"").to_string().contains("invalid escape"));
        assert!(read_err("(1 . 2 3)")
            .to_string()
            .contains("more than one elements after dot."));
    }

    #[test]
    fn test_overlong_symbol_is_parse_error() {
        let name = "x".repeat(SYMBOL_NAME_MAX + 1);
        assert!(read_err(&name).to_string().contains("too long symbol name"));
    }
}
