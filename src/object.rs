//! The tagged value shared by the constant pool and the VM's value stack.
//! `Rc` is the sole ownership authority — no arena, no tracing collector.
//! The source language can't build reference cycles (closures don't capture
//! outer locals), so plain refcounting can't leak.

use std::fmt;
use std::rc::Rc;

pub type NativeFn = fn(&[Rc<Object>]) -> Object;

#[derive(Clone, PartialEq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinFunction({})", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    // `Rc<[u8]>` rather than `Vec<u8>` so the VM can clone a reference to
    // the currently-executing function's code without copying its bytes on
    // every dispatch step (see `Vm::dispatch_one`).
    pub instructions: Rc<[u8]>,
    pub num_locals: u8,
    pub num_parameters: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Null,
    Error(Rc<str>),
    CompiledFunction(Rc<CompiledFunction>),
    Builtin(BuiltinFunction),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::Null => "NULL",
            Object::Error(_) => "ERROR",
            Object::CompiledFunction(_) => "COMPILED_FUNCTION_OBJ",
            Object::Builtin(_) => "BUILTIN",
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn error(message: impl Into<String>) -> Object {
        Object::Error(Rc::from(message.into()))
    }

    /// Value equality. Integers compare by value, strings by content;
    /// booleans and null are singletons so value equality and identity
    /// coincide. Anything else (functions, errors, builtins) has no
    /// equality defined at the source-language level.
    pub fn equals(&self, other: &Object) -> Result<bool, Object> {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => Ok(a == b),
            (Object::Boolean(a), Object::Boolean(b)) => Ok(a == b),
            (Object::String(a), Object::String(b)) => Ok(a == b),
            (Object::Null, Object::Null) => Ok(true),
            _ => Err(Object::error(format!(
                "unsupported types for comparison: {} == {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    pub fn add(&self, other: &Object) -> Object {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => Object::Integer(a + b),
            (Object::String(a), Object::String(b)) => {
                Object::String(Rc::from(format!("{}{}", a, b)))
            }
            _ => unsupported_types("+", self, other),
        }
    }

    pub fn sub(&self, other: &Object) -> Object {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => Object::Integer(a - b),
            _ => unsupported_types("-", self, other),
        }
    }

    pub fn mul(&self, other: &Object) -> Object {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => Object::Integer(a * b),
            _ => unsupported_types("*", self, other),
        }
    }

    pub fn div(&self, other: &Object) -> Object {
        match (self, other) {
            (Object::Integer(_), Object::Integer(0)) => {
                Object::error("division by zero")
            }
            (Object::Integer(a), Object::Integer(b)) => Object::Integer(a / b),
            _ => unsupported_types("/", self, other),
        }
    }

    pub fn greater_than(&self, other: &Object) -> Object {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => Object::Boolean(a > b),
            _ => unsupported_types(">", self, other),
        }
    }

    pub fn negate(&self) -> Object {
        match self {
            Object::Integer(n) => Object::Integer(-n),
            _ => Object::error(format!("unsupported type for negation: {}", self.type_name())),
        }
    }
}

fn unsupported_types(operator: &str, left: &Object, right: &Object) -> Object {
    Object::error(format!(
        "unsupported types for binary operator: {} {} {}",
        left.type_name(),
        operator,
        right.type_name()
    ))
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{}", n),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::String(s) => write!(f, "{}", s),
            Object::Null => write!(f, "null"),
            Object::Error(msg) => write!(f, "ERROR: {}", msg),
            Object::CompiledFunction(_) => write!(f, "CompiledFunction[..]"),
            Object::Builtin(b) => write!(f, "builtin function: {}", b.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_equality_is_by_value() {
        assert_eq!(Object::Integer(5).equals(&Object::Integer(5)), Ok(true));
        assert_eq!(Object::Integer(5).equals(&Object::Integer(6)), Ok(false));
    }

    #[test]
    fn string_equality_is_by_content() {
        let a = Object::String(Rc::from("hi"));
        let b = Object::String(Rc::from("hi"));
        assert_eq!(a.equals(&b), Ok(true));
    }

    #[test]
    fn string_concatenation() {
        let a = Object::String(Rc::from("foo"));
        let b = Object::String(Rc::from("bar"));
        match a.add(&b) {
            Object::String(s) => assert_eq!(&*s, "foobar"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn mismatched_arithmetic_is_an_error_object() {
        match Object::Integer(1).add(&Object::Boolean(true)) {
            Object::Error(_) => {}
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn truthiness() {
        assert!(Object::Integer(0).is_truthy());
        assert!(!Object::Boolean(false).is_truthy());
        assert!(!Object::Null.is_truthy());
        assert!(Object::Boolean(true).is_truthy());
    }
}
