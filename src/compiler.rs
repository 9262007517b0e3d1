//! Walks the AST, emits bytecode, and tracks scopes and name resolution.
//! Mirrors (in spirit) `compile_statement`/`compile_expression` from the
//! original implementation this spec distills from, but expressed as
//! idiomatic Rust: pattern match over tagged AST, `Result`-propagated
//! errors instead of integer error codes.

use std::rc::Rc;

use crate::ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::builtins;
use crate::code::{change_operand_in_place, make_instruction, replace_at, Opcode};
use crate::error::CompileError;
use crate::object::{CompiledFunction, Object};
use crate::symbol_table::{SymbolScope, SymbolTable};

pub struct Bytecode {
    pub instructions: Vec<u8>,
    pub constants: Vec<Rc<Object>>,
}

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

struct CompilerScope {
    instructions: Vec<u8>,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

impl CompilerScope {
    fn new() -> Self {
        CompilerScope {
            instructions: Vec::new(),
            last_instruction: None,
            previous_instruction: None,
        }
    }
}

pub struct Compiler {
    constants: Vec<Rc<Object>>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilerScope>,
    scope_index: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in builtins::BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index as u16, builtin.name);
        }
        Compiler {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilerScope::new()],
            scope_index: 0,
        }
    }

    /// A compiler seeded from a previous run's symbol table and constant
    /// pool, so a host (e.g. a REPL) can compile successive top-level
    /// fragments while keeping global-slot and constant-pool indices
    /// stable across calls.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Rc<Object>>) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilerScope::new()],
            scope_index: 0,
        }
    }

    pub fn into_symbol_table(self) -> SymbolTable {
        self.symbol_table
    }

    pub fn compile_program(&mut self, program: &Program) -> Result<(), CompileError> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    pub fn bytecode(self) -> Bytecode {
        let instructions = self.scopes.into_iter().next().unwrap().instructions;
        Bytecode {
            instructions,
            constants: self.constants,
        }
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::Pop, &[]);
            }
            Statement::Let { name, value } => {
                let symbol = self.symbol_table.define(name);
                self.compile_expression(value)?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index as usize]),
                    SymbolScope::Local => self.emit(Opcode::SetLocal, &[symbol.index as usize]),
                    SymbolScope::Builtin => {
                        unreachable!("define() never assigns builtin scope")
                    }
                };
            }
            Statement::Return(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::Integer(value) => {
                let index = self.add_constant(Object::Integer(*value));
                self.emit(Opcode::Const, &[index]);
            }
            Expression::StringLiteral(value) => {
                let index = self.add_constant(Object::String(Rc::from(value.as_str())));
                self.emit(Opcode::Const, &[index]);
            }
            Expression::Boolean(true) => {
                self.emit(Opcode::True, &[]);
            }
            Expression::Boolean(false) => {
                self.emit(Opcode::False, &[]);
            }
            Expression::Identifier(name) => self.compile_identifier(name)?,
            Expression::Prefix { operator, right } => {
                self.compile_expression(right)?;
                match operator {
                    PrefixOperator::Bang => self.emit(Opcode::Bang, &[]),
                    PrefixOperator::Minus => self.emit(Opcode::Minus, &[]),
                };
            }
            Expression::Infix { operator, left, right } => self.compile_infix(*operator, left, right)?,
            Expression::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref())?,
            Expression::Function { parameters, body } => self.compile_function(parameters, body)?,
            Expression::Call { function, arguments } => {
                self.compile_expression(function)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[arguments.len()]);
            }
        }
        Ok(())
    }

    fn compile_identifier(&mut self, name: &str) -> Result<(), CompileError> {
        let symbol = self
            .symbol_table
            .resolve(name)
            .ok_or_else(|| CompileError::UndefinedVariable(name.to_string()))?;
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index as usize]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index as usize]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index as usize]),
        };
        Ok(())
    }

    fn compile_infix(
        &mut self,
        operator: InfixOperator,
        left: &Expression,
        right: &Expression,
    ) -> Result<(), CompileError> {
        if operator == InfixOperator::Lt {
            // No dedicated LESS_THAN in the wire format: swap the operand
            // order and reuse GREATER_THAN.
            self.compile_expression(right)?;
            self.compile_expression(left)?;
            self.emit(Opcode::GreaterThan, &[]);
            return Ok(());
        }

        self.compile_expression(left)?;
        self.compile_expression(right)?;
        let opcode = match operator {
            InfixOperator::Add => Opcode::Add,
            InfixOperator::Sub => Opcode::Sub,
            InfixOperator::Mul => Opcode::Mul,
            InfixOperator::Div => Opcode::Div,
            InfixOperator::Eq => Opcode::Eq,
            InfixOperator::NotEq => Opcode::NotEq,
            InfixOperator::Gt => Opcode::GreaterThan,
            InfixOperator::Lt => unreachable!("handled above"),
        };
        self.emit(opcode, &[]);
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expression,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
    ) -> Result<(), CompileError> {
        self.compile_expression(condition)?;
        let jump_not_true_pos = self.emit(Opcode::JumpNotTrue, &[0xFFFF]);

        self.compile_block(consequence)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        }

        let jump_pos = self.emit(Opcode::Jump, &[0xFFFF]);
        let after_consequence = self.current_instructions().len();
        self.change_operand(jump_not_true_pos, after_consequence);

        match alternative {
            Some(block) => {
                self.compile_block(block)?;
                if self.last_instruction_is(Opcode::Pop) {
                    self.remove_last_pop();
                }
            }
            None => {
                self.emit(Opcode::Null, &[]);
            }
        }

        let after_alternative = self.current_instructions().len();
        self.change_operand(jump_pos, after_alternative);
        Ok(())
    }

    fn compile_function(
        &mut self,
        parameters: &[String],
        body: &BlockStatement,
    ) -> Result<(), CompileError> {
        self.enter_scope();

        for parameter in parameters {
            self.symbol_table.define(parameter);
        }

        self.compile_block(body)?;

        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return_value();
        } else if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[]);
        }

        let num_locals = self.symbol_table.size();
        let instructions = self.leave_scope();
        let function = CompiledFunction {
            instructions: Rc::from(instructions),
            num_locals: num_locals as u8,
            num_parameters: parameters.len() as u8,
        };
        let index = self.add_constant(Object::CompiledFunction(Rc::new(function)));
        self.emit(Opcode::Const, &[index]);
        Ok(())
    }

    // --- scope and emission plumbing -----------------------------------

    fn enter_scope(&mut self) {
        self.scopes.push(CompilerScope::new());
        self.scope_index += 1;
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Vec<u8> {
        let scope = self.scopes.pop().expect("leave_scope with no scope pushed");
        self.scope_index -= 1;
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = outer.into_outer();
        scope.instructions
    }

    fn current_instructions(&self) -> &Vec<u8> {
        &self.scopes[self.scope_index].instructions
    }

    fn add_constant(&mut self, object: Object) -> usize {
        self.constants.push(Rc::new(object));
        self.constants.len() - 1
    }

    fn add_instruction(&mut self, instruction: &[u8]) -> usize {
        let position = self.current_instructions().len();
        self.scopes[self.scope_index].instructions.extend_from_slice(instruction);
        position
    }

    fn emit(&mut self, opcode: Opcode, operands: &[usize]) -> usize {
        let instruction = make_instruction(opcode, operands);
        let position = self.add_instruction(&instruction);
        let scope = &mut self.scopes[self.scope_index];
        scope.previous_instruction = scope.last_instruction.take();
        scope.last_instruction = Some(EmittedInstruction { opcode, position });
        position
    }

    fn last_instruction_is(&self, opcode: Opcode) -> bool {
        match &self.scopes[self.scope_index].last_instruction {
            Some(emitted) => emitted.opcode == opcode,
            None => false,
        }
    }

    fn remove_last_pop(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        let last = scope.last_instruction.take().expect("no instruction to remove");
        scope.instructions.truncate(last.position);
        scope.last_instruction = scope.previous_instruction.take();
    }

    fn replace_instruction(&mut self, position: usize, new_instruction: &[u8]) {
        replace_at(&mut self.scopes[self.scope_index].instructions, position, new_instruction);
    }

    fn replace_last_pop_with_return_value(&mut self) {
        let position = self.scopes[self.scope_index]
            .last_instruction
            .as_ref()
            .expect("no instruction to replace")
            .position;
        let new_instruction = make_instruction(Opcode::ReturnValue, &[]);
        self.replace_instruction(position, &new_instruction);
        self.scopes[self.scope_index].last_instruction.as_mut().unwrap().opcode = Opcode::ReturnValue;
    }

    fn change_operand(&mut self, position: usize, operand: usize) {
        change_operand_in_place(&mut self.scopes[self.scope_index].instructions, position, operand);
    }
}
