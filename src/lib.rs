//! Compiler, symbol table, and stack-based bytecode VM for a small
//! dynamically-typed, expression-oriented language. This crate is the core
//! engine only: it consumes an [`ast::Program`] and does not include a
//! lexer, parser, or REPL — those are external collaborators that produce
//! the AST this crate walks.

pub mod ast;
pub mod builtins;
pub mod code;
pub mod compiler;
pub mod error;
pub mod object;
pub mod symbol_table;
pub mod telemetry;
pub mod vm;

use std::rc::Rc;

pub use ast::Program;
pub use compiler::{Bytecode, Compiler};
pub use error::{CompileError, RuntimeError};
pub use object::Object;
pub use vm::Vm;

/// Lower a program to bytecode with a fresh compiler (builtins pre-bound,
/// empty constant pool and symbol table).
pub fn compile(program: &Program) -> Result<Bytecode, CompileError> {
    let mut compiler = Compiler::new();
    compiler.compile_program(program)?;
    Ok(compiler.bytecode())
}

/// Run a bytecode program to completion on a fresh VM and return its
/// single result value.
pub fn run(bytecode: Bytecode) -> Result<Rc<Object>, RuntimeError> {
    let mut vm = Vm::new(bytecode);
    vm.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BlockStatement, Expression, InfixOperator, Statement};

    fn prog(statements: Vec<Statement>) -> Program {
        Program { statements }
    }

    #[test]
    fn one_plus_two() {
        let program = prog(vec![Statement::Expression(Expression::Infix {
            operator: InfixOperator::Add,
            left: Box::new(Expression::Integer(1)),
            right: Box::new(Expression::Integer(2)),
        })]);
        let bytecode = compile(&program).unwrap();
        let result = run(bytecode).unwrap();
        assert_eq!(*result, Object::Integer(3));
    }

    #[test]
    fn let_bindings_and_arithmetic() {
        // let a = 5; let b = a * 2; b - 1
        let program = prog(vec![
            Statement::Let {
                name: "a".to_string(),
                value: Expression::Integer(5),
            },
            Statement::Let {
                name: "b".to_string(),
                value: Expression::Infix {
                    operator: InfixOperator::Mul,
                    left: Box::new(Expression::Identifier("a".to_string())),
                    right: Box::new(Expression::Integer(2)),
                },
            },
            Statement::Expression(Expression::Infix {
                operator: InfixOperator::Sub,
                left: Box::new(Expression::Identifier("b".to_string())),
                right: Box::new(Expression::Integer(1)),
            }),
        ]);
        let bytecode = compile(&program).unwrap();
        let result = run(bytecode).unwrap();
        assert_eq!(*result, Object::Integer(9));
    }

    #[test]
    fn if_else_takes_the_false_branch() {
        // if (1 > 2) { 10 } else { 20 }
        let program = prog(vec![Statement::Expression(Expression::If {
            condition: Box::new(Expression::Infix {
                operator: InfixOperator::Gt,
                left: Box::new(Expression::Integer(1)),
                right: Box::new(Expression::Integer(2)),
            }),
            consequence: BlockStatement {
                statements: vec![Statement::Expression(Expression::Integer(10))],
            },
            alternative: Some(BlockStatement {
                statements: vec![Statement::Expression(Expression::Integer(20))],
            }),
        })]);
        let bytecode = compile(&program).unwrap();
        let result = run(bytecode).unwrap();
        assert_eq!(*result, Object::Integer(20));
    }

    #[test]
    fn calling_a_compiled_function() {
        // let add = fn(x, y) { x + y }; add(3, 4)
        let program = prog(vec![
            Statement::Let {
                name: "add".to_string(),
                value: Expression::Function {
                    parameters: vec!["x".to_string(), "y".to_string()],
                    body: BlockStatement {
                        statements: vec![Statement::Expression(Expression::Infix {
                            operator: InfixOperator::Add,
                            left: Box::new(Expression::Identifier("x".to_string())),
                            right: Box::new(Expression::Identifier("y".to_string())),
                        })],
                    },
                },
            },
            Statement::Expression(Expression::Call {
                function: Box::new(Expression::Identifier("add".to_string())),
                arguments: vec![Expression::Integer(3), Expression::Integer(4)],
            }),
        ]);
        let bytecode = compile(&program).unwrap();
        let result = run(bytecode).unwrap();
        assert_eq!(*result, Object::Integer(7));
    }

    #[test]
    fn closing_over_an_outer_local_is_a_compile_error() {
        // let makeAdder = fn(x) { fn(y) { x + y } }; — x is free in the inner
        // function literal, which this implementation does not capture.
        let program = prog(vec![Statement::Let {
            name: "make_adder".to_string(),
            value: Expression::Function {
                parameters: vec!["x".to_string()],
                body: BlockStatement {
                    statements: vec![Statement::Expression(Expression::Function {
                        parameters: vec!["y".to_string()],
                        body: BlockStatement {
                            statements: vec![Statement::Expression(Expression::Infix {
                                operator: InfixOperator::Add,
                                left: Box::new(Expression::Identifier("x".to_string())),
                                right: Box::new(Expression::Identifier("y".to_string())),
                            })],
                        },
                    })],
                },
            },
        }]);
        let err = compile(&program).unwrap_err();
        assert_eq!(err, CompileError::UndefinedVariable("x".to_string()));
    }

    #[test]
    fn len_of_a_string() {
        let program = prog(vec![Statement::Expression(Expression::Call {
            function: Box::new(Expression::Identifier("len".to_string())),
            arguments: vec![Expression::StringLiteral("hello".to_string())],
        })]);
        let bytecode = compile(&program).unwrap();
        let result = run(bytecode).unwrap();
        assert_eq!(*result, Object::Integer(5));
    }

    #[test]
    fn puts_returns_null() {
        let program = prog(vec![Statement::Expression(Expression::Call {
            function: Box::new(Expression::Identifier("puts".to_string())),
            arguments: vec![Expression::StringLiteral("hi".to_string())],
        })]);
        let bytecode = compile(&program).unwrap();
        let result = run(bytecode).unwrap();
        assert_eq!(*result, Object::Null);
    }
}
