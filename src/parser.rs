//! Operator-precedence recursive-descent parser: token stream to AST.
//!
//! Grounded on the teacher's cursor-over-`Vec<Token>` `Parser` struct shape
//! (`parser.rs`'s `check`/`consume`/`advance`/`current` helpers), rebuilt for
//! the Pascal grammar in the expanded specification's §4.2.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{tokenize, ScalarTypeName, Token, TokenKind};
use crate::types::{ArrayType, Field, ScalarType, Type};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(source: &str) -> Result<Self, crate::error::LexError> {
        let tokens = tokenize(source)?;
        Ok(Parser { tokens, pos: 0 })
    }

    pub fn parse_program(&mut self) -> PResult<Program> {
        let header = self.parse_header()?;
        let block = self.parse_block()?;
        self.expect(TokenKind::Dot)?;
        Ok(Program { header, block })
    }

    // --- header -------------------------------------------------------

    fn parse_header(&mut self) -> PResult<ProgramHeader> {
        let line = self.current().line;
        self.expect(TokenKind::Program)?;
        let name = self.expect_ident()?;
        let params = if self.check(&TokenKind::LParen) {
            self.advance();
            let ids = self.parse_id_list()?;
            self.expect(TokenKind::RParen)?;
            ids
        } else {
            Vec::new()
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(ProgramHeader { name, params, line })
    }

    fn parse_id_list(&mut self) -> PResult<Vec<String>> {
        let mut ids = vec![self.expect_ident()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            ids.push(self.expect_ident()?);
        }
        Ok(ids)
    }

    // --- block / declarations ------------------------------------------

    fn parse_block(&mut self) -> PResult<Block> {
        let mut declarations = Vec::new();
        loop {
            match &self.current().kind {
                TokenKind::Var => declarations.push(Declaration::Variable(self.parse_variable_decl()?)),
                TokenKind::Const => declarations.push(Declaration::Constant(self.parse_const_decl()?)),
                TokenKind::Type => declarations.push(Declaration::Type(self.parse_type_decl()?)),
                TokenKind::Function => declarations.push(Declaration::Function(self.parse_function_decl()?)),
                TokenKind::Procedure => declarations.push(Declaration::Procedure(self.parse_procedure_decl()?)),
                _ => break,
            }
        }
        let compound_statement = self.parse_compound_statement()?;
        Ok(Block { declarations, compound_statement })
    }

    fn parse_variable_decl(&mut self) -> PResult<VariableDeclaration> {
        let line = self.current().line;
        self.expect(TokenKind::Var)?;
        let mut variable_list = vec![self.parse_variable_group()?];
        self.expect(TokenKind::Semicolon)?;
        while self.is_id_list_start() {
            variable_list.push(self.parse_variable_group()?);
            self.expect(TokenKind::Semicolon)?;
        }
        Ok(VariableDeclaration { variable_list, line })
    }

    fn is_id_list_start(&self) -> bool {
        matches!(self.current().kind, TokenKind::Ident)
    }

    fn parse_variable_group(&mut self) -> PResult<VariableGroup> {
        let id_list = self.parse_id_list()?;
        self.expect(TokenKind::Colon)?;
        let var_type = self.parse_type()?;
        Ok(VariableGroup { id_list, var_type })
    }

    fn parse_const_decl(&mut self) -> PResult<ConstantDeclaration> {
        let line = self.current().line;
        self.expect(TokenKind::Const)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_literal()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(ConstantDeclaration { name, value, line })
    }

    fn parse_type_decl(&mut self) -> PResult<TypeDeclaration> {
        let line = self.current().line;
        self.expect(TokenKind::Type)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        let declared_type = self.parse_type()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(TypeDeclaration { name, declared_type, line })
    }

    fn parse_type(&mut self) -> PResult<Type> {
        match &self.current().kind {
            TokenKind::TypeName(name) => {
                let scalar = scalar_from_type_name(*name);
                self.advance();
                Ok(Type::Scalar(scalar))
            }
            TokenKind::Array => {
                self.advance();
                self.expect(TokenKind::LBracket)?;
                let lower_bound = self.expect_int_literal()?;
                self.expect(TokenKind::Dot)?;
                self.expect(TokenKind::Dot)?;
                let upper_bound = self.expect_int_literal()?;
                self.expect(TokenKind::RBracket)?;
                self.expect(TokenKind::Of)?;
                let element_type = self.parse_type()?;
                Ok(Type::Array(Box::new(ArrayType { lower_bound, upper_bound, element_type })))
            }
            TokenKind::Record => {
                self.advance();
                let mut fields = Vec::new();
                while !self.check(&TokenKind::End) {
                    let names = self.parse_id_list()?;
                    self.expect(TokenKind::Colon)?;
                    let field_type = self.parse_type()?;
                    for name in names {
                        fields.push(Field { name, field_type: field_type.clone() });
                    }
                    if self.check(&TokenKind::Semicolon) {
                        self.advance();
                    }
                }
                self.expect(TokenKind::End)?;
                Ok(Type::Record(fields))
            }
            TokenKind::Ident => {
                // Reference to a previously `type`-declared name: resolved at
                // semantic-check time, not here. Carried structurally as a
                // single-field record tagged with the alias name so the
                // resolver can substitute the real type.
                let name = self.expect_ident()?;
                Ok(Type::Record(vec![Field { name: format!("@alias:{name}"), field_type: Type::Scalar(ScalarType::Integer) }]))
            }
            other => Err(self.error(format!("expected type name, found {:?}", other))),
        }
    }

    fn parse_literal(&mut self) -> PResult<Literal> {
        let tok = self.current().clone();
        let lit = match &tok.kind {
            TokenKind::IntLiteral(n) => {
                self.advance();
                Literal::Integer(*n)
            }
            TokenKind::RealLiteral(x) => {
                self.advance();
                Literal::Real(*x)
            }
            TokenKind::StringLiteral => {
                self.advance();
                Literal::Str(tok.text.clone())
            }
            TokenKind::Minus => {
                self.advance();
                match &self.current().kind {
                    TokenKind::IntLiteral(n) => {
                        let n = *n;
                        self.advance();
                        Literal::Integer(-n)
                    }
                    TokenKind::RealLiteral(x) => {
                        let x = *x;
                        self.advance();
                        Literal::Real(-x)
                    }
                    other => return Err(self.error(format!("expected number after '-', found {:?}", other))),
                }
            }
            other => return Err(self.error(format!("expected a literal, found {:?}", other))),
        };
        Ok(lit)
    }

    fn expect_int_literal(&mut self) -> PResult<i64> {
        match self.current().kind {
            TokenKind::IntLiteral(n) => {
                self.advance();
                Ok(n)
            }
            ref other => Err(self.error(format!("expected integer literal, found {:?}", other))),
        }
    }

    // --- subprogram declarations -----------------------------------------

    fn parse_parameter_list(&mut self) -> PResult<Vec<Parameter>> {
        if !self.check(&TokenKind::LParen) {
            return Ok(Vec::new());
        }
        self.advance();
        let mut params = vec![self.parse_param_section()?];
        while self.check(&TokenKind::Semicolon) {
            self.advance();
            params.push(self.parse_param_section()?);
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_param_section(&mut self) -> PResult<Parameter> {
        let is_var = if self.check(&TokenKind::Var) {
            self.advance();
            true
        } else {
            false
        };
        let id_list = self.parse_id_list()?;
        self.expect(TokenKind::Colon)?;
        let param_type = self.parse_type()?;
        Ok(Parameter { id_list, param_type, is_var })
    }

    fn parse_function_decl(&mut self) -> PResult<FunctionDeclaration> {
        let line = self.current().line;
        self.expect(TokenKind::Function)?;
        let name = self.expect_ident()?;
        let parameter_list = self.parse_parameter_list()?;
        self.expect(TokenKind::Colon)?;
        let return_type = self.parse_type()?;
        self.expect(TokenKind::Semicolon)?;
        let block = self.parse_block()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(FunctionDeclaration { name, parameter_list, return_type, block, line })
    }

    fn parse_procedure_decl(&mut self) -> PResult<ProcedureDeclaration> {
        let line = self.current().line;
        self.expect(TokenKind::Procedure)?;
        let name = self.expect_ident()?;
        let parameter_list = self.parse_parameter_list()?;
        self.expect(TokenKind::Semicolon)?;
        let block = self.parse_block()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(ProcedureDeclaration { name, parameter_list, block, line })
    }

    // --- statements -------------------------------------------------------

    fn parse_compound_statement(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::Begin)?;
        let mut statements = vec![self.parse_statement()?];
        while self.check(&TokenKind::Semicolon) {
            self.advance();
            if self.check(&TokenKind::End) {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::End)?;
        Ok(Statement::Compound(statements))
    }

    fn parse_statement(&mut self) -> PResult<Statement> {
        match &self.current().kind {
            TokenKind::Begin => self.parse_compound_statement(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::For => self.parse_for(),
            TokenKind::Case => self.parse_case(),
            TokenKind::Ident if self.is_io_call_name() => self.parse_io_call(),
            TokenKind::Ident => self.parse_assignment_or_call(),
            TokenKind::End | TokenKind::Semicolon => Ok(Statement::Empty),
            other => Err(self.error(format!("unexpected token {:?} in statement", other))),
        }
    }

    fn is_io_call_name(&self) -> bool {
        matches!(self.current().text.to_lowercase().as_str(), "write" | "writeln" | "read" | "readln")
            && matches!(self.peek(1).kind, TokenKind::LParen)
    }

    fn parse_io_call(&mut self) -> PResult<Statement> {
        let operation = match self.current().text.to_lowercase().as_str() {
            "write" => IOOperation::Write,
            "writeln" => IOOperation::Writeln,
            "read" => IOOperation::Read,
            "readln" => IOOperation::Readln,
            _ => unreachable!(),
        };
        self.advance();
        self.expect(TokenKind::LParen)?;
        let arguments = if self.check(&TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };
        self.expect(TokenKind::RParen)?;
        Ok(Statement::IOCall { operation, arguments })
    }

    fn parse_assignment_or_call(&mut self) -> PResult<Statement> {
        let line = self.current().line;
        let lvalue = self.parse_postfix_identifier()?;
        if self.check(&TokenKind::Assign) {
            self.advance();
            let expression = self.parse_expression()?;
            return Ok(Statement::Assignment {
                variable: Box::new(lvalue),
                expression: Box::new(expression),
                line,
            });
        }
        // Bare procedure call statement.
        if let Expression::Call(call) = lvalue {
            return Ok(Statement::Call(call));
        }
        if let Expression::Identifier { name, line } = lvalue {
            return Ok(Statement::Call(FunctionCall { name, arguments: Vec::new(), line }));
        }
        Err(self.error("expected ':=' or statement call".to_string()))
    }

    fn parse_if(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::If)?;
        let condition = Box::new(self.parse_expression()?);
        self.expect(TokenKind::Then)?;
        let then_statement = Box::new(self.parse_statement()?);
        let else_statement = if self.check(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If { condition, then_statement, else_statement })
    }

    fn parse_while(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::While)?;
        let condition = Box::new(self.parse_expression()?);
        self.expect(TokenKind::Do)?;
        let statement = Box::new(self.parse_statement()?);
        Ok(Statement::While { condition, statement })
    }

    fn parse_repeat(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::Repeat)?;
        let mut statement_list = vec![self.parse_statement()?];
        while self.check(&TokenKind::Semicolon) {
            self.advance();
            if self.check(&TokenKind::Until) {
                break;
            }
            statement_list.push(self.parse_statement()?);
        }
        self.expect(TokenKind::Until)?;
        let condition = Box::new(self.parse_expression()?);
        Ok(Statement::Repeat { statement_list, condition })
    }

    fn parse_for(&mut self) -> PResult<Statement> {
        self.expect(TokenKind::For)?;
        let line = self.current().line;
        let name = self.expect_ident()?;
        let control_variable = Box::new(Expression::Identifier { name, line });
        self.expect(TokenKind::Assign)?;
        let start_expression = Box::new(self.parse_expression()?);
        let downto = if self.check(&TokenKind::Downto) {
            self.advance();
            true
        } else {
            self.expect(TokenKind::To)?;
            false
        };
        let end_expression = Box::new(self.parse_expression()?);
        self.expect(TokenKind::Do)?;
        let statement = Box::new(self.parse_statement()?);
        Ok(Statement::For { control_variable, start_expression, end_expression, downto, statement })
    }

    fn parse_case(&mut self) -> PResult<Statement> {
        let line = self.current().line;
        self.expect(TokenKind::Case)?;
        // Accepted but not interpreted: consume up to matching `end`.
        let _ = self.parse_expression()?;
        self.expect(TokenKind::Of)?;
        let mut depth = 1usize;
        while depth > 0 {
            match &self.current().kind {
                TokenKind::Case => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::End => {
                    depth -= 1;
                    self.advance();
                }
                TokenKind::Eof => return Err(self.error("unexpected end of file in 'case'".to_string())),
                _ => {
                    self.advance();
                }
            }
        }
        Ok(Statement::Case { line })
    }

    // --- expressions --------------------------------------------------------

    fn parse_expression_list(&mut self) -> PResult<Vec<Expression>> {
        let mut exprs = vec![self.parse_expression()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    pub fn parse_expression(&mut self) -> PResult<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expression> {
        let mut left = self.parse_and()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Or => "OR",
                TokenKind::Orelse => "ORELSE",
                _ => break,
            };
            self.advance();
            let right = self.parse_and()?;
            left = Expression::BinaryOperation { operator: op.to_string(), left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<Expression> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::And => "AND",
                TokenKind::Andthen => "ANDTHEN",
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expression::BinaryOperation { operator: op.to_string(), left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> PResult<Expression> {
        let left = self.parse_additive()?;
        let op = match &self.current().kind {
            TokenKind::Eq => "=",
            TokenKind::Ne => "<>",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::In => "IN",
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expression::BinaryOperation { operator: op.to_string(), left: Box::new(left), right: Box::new(right) })
    }

    fn parse_additive(&mut self) -> PResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Plus => "+",
                TokenKind::Minus => "-",
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::BinaryOperation { operator: op.to_string(), left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current().kind {
                TokenKind::Times => "*",
                TokenKind::Divide => "/",
                TokenKind::Div => "DIV",
                TokenKind::Mod => "MOD",
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::BinaryOperation { operator: op.to_string(), left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expression> {
        match &self.current().kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::UnaryOperation { operator: "-".to_string(), operand: Box::new(operand) })
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::UnaryOperation { operator: "NOT".to_string(), operand: Box::new(operand) })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            match &self.current().kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expression::ArrayAccess { array: Box::new(expr), index: Box::new(index) };
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_ident()?;
                    expr = Expression::FieldAccess { record: Box::new(expr), field };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Like `parse_postfix` but only accepts identifier-rooted lvalues
    /// (assignment targets, procedure-call statements).
    fn parse_postfix_identifier(&mut self) -> PResult<Expression> {
        self.parse_postfix()
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        let tok = self.current().clone();
        match &tok.kind {
            TokenKind::IntLiteral(n) => {
                self.advance();
                Ok(Expression::Literal(Literal::Integer(*n)))
            }
            TokenKind::RealLiteral(x) => {
                self.advance();
                Ok(Expression::Literal(Literal::Real(*x)))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Expression::Literal(Literal::Str(tok.text.clone())))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Ident => {
                let name = tok.text.clone();
                let line = tok.line;
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let arguments = if self.check(&TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect(TokenKind::RParen)?;
                    return Ok(Expression::Call(FunctionCall { name, arguments, line }));
                }
                Ok(Expression::Identifier { name, line })
            }
            other => Err(self.error(format!("expected expression, found {:?}", other))),
        }
    }

    // --- low-level helpers --------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<()> {
        if self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            let found = self.current().kind.clone();
            Err(self.error(format!("expected {:?}, found {:?}", kind, found)))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        if matches!(self.current().kind, TokenKind::Ident) {
            Ok(self.advance().text.clone())
        } else {
            let found = self.current().kind.clone();
            Err(self.error(format!("expected identifier, found {:?}", found)))
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError { message, line: self.current().line }
    }
}

fn scalar_from_type_name(name: ScalarTypeName) -> ScalarType {
    ScalarType::from_name(name.as_str()).expect("ScalarTypeName always maps to a ScalarType")
}

pub fn parse(source: &str) -> Result<Program, crate::error::CompileError> {
    let mut parser = Parser::new(source)?;
    Ok(parser.parse_program()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello_world() {
        let program = parse("program Hello; begin writeln('hi') end.").unwrap();
        assert_eq!(program.header.name, "Hello");
        match &program.block.compound_statement {
            Statement::Compound(stmts) => assert_eq!(stmts.len(), 1),
            _ => panic!("expected compound statement"),
        }
    }

    #[test]
    fn parses_variable_declaration_and_assignment() {
        let program = parse("program P; var x: integer; begin x := 3 + 4 end.").unwrap();
        match &program.block.declarations[0] {
            Declaration::Variable(decl) => assert_eq!(decl.variable_list[0].id_list, vec!["x".to_string()]),
            _ => panic!("expected variable declaration"),
        }
    }

    #[test]
    fn parses_for_loop_with_to_and_downto() {
        let program = parse("program P; var i: integer; begin for i := 1 to 3 do writeln(i) end.").unwrap();
        let Statement::Compound(stmts) = &program.block.compound_statement else { panic!() };
        assert!(matches!(stmts[0], Statement::For { downto: false, .. }));

        let program2 = parse("program P; var i: integer; begin for i := 3 downto 1 do writeln(i) end.").unwrap();
        let Statement::Compound(stmts2) = &program2.block.compound_statement else { panic!() };
        assert!(matches!(stmts2[0], Statement::For { downto: true, .. }));
    }

    #[test]
    fn parses_array_type_and_element_access() {
        let program = parse(
            "program P; var a: array[1..5] of integer; begin a[2] := 7 end.",
        )
        .unwrap();
        match &program.block.declarations[0] {
            Declaration::Variable(decl) => match &decl.variable_list[0].var_type {
                Type::Array(arr) => {
                    assert_eq!(arr.lower_bound, 1);
                    assert_eq!(arr.upper_bound, 5);
                }
                _ => panic!("expected array type"),
            },
            _ => panic!("expected variable declaration"),
        }
    }

    #[test]
    fn parses_var_parameter_procedure() {
        let program = parse(
            "program P; procedure inc(var x: integer); begin x := x + 1 end; begin end.",
        )
        .unwrap();
        match &program.block.declarations[0] {
            Declaration::Procedure(p) => assert!(p.parameter_list[0].is_var),
            _ => panic!("expected procedure declaration"),
        }
    }

    #[test]
    fn operator_precedence_binds_multiplicative_tighter_than_additive() {
        let program = parse("program P; begin writeln(1 + 2 * 3) end.").unwrap();
        let Statement::Compound(stmts) = &program.block.compound_statement else { panic!() };
        let Statement::IOCall { arguments, .. } = &stmts[0] else { panic!() };
        match &arguments[0] {
            Expression::BinaryOperation { operator, right, .. } => {
                assert_eq!(operator, "+");
                assert!(matches!(**right, Expression::BinaryOperation { .. }));
            }
            _ => panic!("expected '+' at the top"),
        }
    }

    #[test]
    fn case_statement_is_accepted_but_parsed_shallowly() {
        let program = parse(
            "program P; var x: integer; begin case x of 1: x := 1; 2: x := 2 end end.",
        )
        .unwrap();
        let Statement::Compound(stmts) = &program.block.compound_statement else { panic!() };
        assert!(matches!(stmts[0], Statement::Case { .. }));
    }

    #[test]
    fn reports_syntax_error_with_line_number() {
        let err = parse("program P;\nbegin x := end.").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
