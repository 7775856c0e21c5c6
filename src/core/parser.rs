use crate::domain::ast::{BinaryOp, Expr, Field, Literal, Method, Source, Stmt};
use crate::domain::token::{Token, TokenKind};
use crate::utils::error::{PlcError, Result};

/// Recursive-descent parser over the lexer's token stream.
///
/// Each grammar rule has its own method. A pattern is either a token kind or
/// an exact literal; keywords are identifiers matched by literal, so they
/// never collide with quoted strings.
pub struct Parser {
    tokens: TokenStream,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: TokenStream::new(tokens),
        }
    }

    /// `source ::= field* method*`
    pub fn parse_source(&mut self) -> Result<Source> {
        let mut fields = Vec::new();
        let mut methods = Vec::new();

        while self.tokens.has(0) {
            if self.peek_literal("LET") {
                fields.push(self.parse_field()?);
            } else if self.peek_literal("DEF") {
                methods.push(self.parse_method()?);
            } else {
                return Err(PlcError::parse(
                    "expected a field or method",
                    self.tokens.get(0).index,
                ));
            }
        }
        Ok(Source { fields, methods })
    }

    /// `field ::= 'LET' 'CONST'? identifier ':' identifier ('=' expression)? ';'`
    pub fn parse_field(&mut self) -> Result<Field> {
        self.expect_literal("LET", "expected 'LET'")?;
        let constant = self.match_literal("CONST");
        let name = self.expect_identifier("expected field name")?;
        self.expect_literal(":", "expected ':' after field name")?;
        let type_name = self.expect_identifier("expected type name")?;
        let value = if self.match_literal("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_literal(";", "expected ';' after field")?;
        Ok(Field {
            name,
            type_name,
            constant,
            value,
            variable: None,
        })
    }

    /// `method ::= 'DEF' identifier '(' params? ')' (':' identifier)? 'DO' statement* 'END'`
    pub fn parse_method(&mut self) -> Result<Method> {
        self.expect_literal("DEF", "expected 'DEF'")?;
        let name = self.expect_identifier("expected method name")?;
        self.expect_literal("(", "expected '(' after method name")?;

        let mut parameters = Vec::new();
        let mut parameter_type_names = Vec::new();
        if !self.match_literal(")") {
            loop {
                parameters.push(self.expect_identifier("expected parameter name")?);
                self.expect_literal(":", "expected ':' after parameter name")?;
                parameter_type_names.push(self.expect_identifier("expected parameter type")?);
                if !self.match_literal(",") {
                    break;
                }
            }
            self.expect_literal(")", "expected ')' after parameters")?;
        }

        let return_type_name = if self.match_literal(":") {
            Some(self.expect_identifier("expected return type")?)
        } else {
            None
        };

        self.expect_literal("DO", "expected 'DO' before method body")?;
        let statements = self.parse_block(&["END"])?;
        self.expect_literal("END", "expected 'END' after method body")?;

        Ok(Method {
            name,
            parameters,
            parameter_type_names,
            return_type_name,
            statements,
            function: None,
        })
    }

    /// Statements until one of `terminators` (or EOF, which the caller turns
    /// into a missing-terminator error).
    fn parse_block(&mut self, terminators: &[&str]) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while self.tokens.has(0) && !terminators.iter().any(|t| self.peek_literal(t)) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    pub fn parse_statement(&mut self) -> Result<Stmt> {
        if self.peek_literal("LET") {
            self.parse_declaration_statement()
        } else if self.peek_literal("IF") {
            self.parse_if_statement()
        } else if self.peek_literal("FOR") {
            self.parse_for_statement()
        } else if self.peek_literal("WHILE") {
            self.parse_while_statement()
        } else if self.peek_literal("RETURN") {
            self.parse_return_statement()
        } else {
            let expression = self.parse_expression()?;
            if self.match_literal("=") {
                let value = self.parse_expression()?;
                self.expect_literal(";", "expected ';' after assignment")?;
                Ok(Stmt::Assignment {
                    receiver: expression,
                    value,
                })
            } else {
                self.expect_literal(";", "expected ';' after expression")?;
                Ok(Stmt::Expression { expression })
            }
        }
    }

    /// `'LET' identifier (':' identifier)? ('=' expression)? ';'`
    fn parse_declaration_statement(&mut self) -> Result<Stmt> {
        self.expect_literal("LET", "expected 'LET'")?;
        let name = self.expect_identifier("expected variable name")?;
        let type_name = if self.match_literal(":") {
            Some(self.expect_identifier("expected type name")?)
        } else {
            None
        };
        let value = if self.match_literal("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_literal(";", "expected ';' after declaration")?;
        Ok(Stmt::Declaration {
            name,
            type_name,
            value,
            variable: None,
        })
    }

    /// `'IF' expression 'DO' statement* ('ELSE' statement*)? 'END'`
    fn parse_if_statement(&mut self) -> Result<Stmt> {
        self.expect_literal("IF", "expected 'IF'")?;
        let condition = self.parse_expression()?;
        self.expect_literal("DO", "expected 'DO' after if condition")?;
        let then_statements = self.parse_block(&["ELSE", "END"])?;
        let else_statements = if self.match_literal("ELSE") {
            self.parse_block(&["END"])?
        } else {
            Vec::new()
        };
        self.expect_literal("END", "expected 'END' after if statement")?;
        Ok(Stmt::If {
            condition,
            then_statements,
            else_statements,
        })
    }

    /// `'FOR' '(' assignment? ';' expression ';' assignment? ')' statement* 'END'`
    ///
    /// The init and increment slots, when present, must be plain
    /// `identifier = expression` assignments.
    fn parse_for_statement(&mut self) -> Result<Stmt> {
        self.expect_literal("FOR", "expected 'FOR'")?;
        self.expect_literal("(", "expected '(' after 'FOR'")?;

        let initialization = if self.peek_literal(";") {
            None
        } else {
            Some(Box::new(self.parse_for_assignment()?))
        };
        self.expect_literal(";", "expected ';' after for initialization")?;

        let condition = self.parse_expression()?;
        self.expect_literal(";", "expected ';' after for condition")?;

        let increment = if self.peek_literal(")") {
            None
        } else {
            Some(Box::new(self.parse_for_assignment()?))
        };
        self.expect_literal(")", "expected ')' after for increment")?;

        let statements = self.parse_block(&["END"])?;
        self.expect_literal("END", "expected 'END' after for body")?;

        Ok(Stmt::For {
            initialization,
            condition,
            increment,
            statements,
        })
    }

    fn parse_for_assignment(&mut self) -> Result<Stmt> {
        let name = self.expect_identifier("expected variable name")?;
        self.expect_literal("=", "expected '=' in for clause")?;
        let value = self.parse_expression()?;
        Ok(Stmt::Assignment {
            receiver: Expr::access(None, name),
            value,
        })
    }

    /// `'WHILE' expression 'DO' statement* 'END'`
    fn parse_while_statement(&mut self) -> Result<Stmt> {
        self.expect_literal("WHILE", "expected 'WHILE'")?;
        let condition = self.parse_expression()?;
        self.expect_literal("DO", "expected 'DO' after while condition")?;
        let statements = self.parse_block(&["END"])?;
        self.expect_literal("END", "expected 'END' after while body")?;
        Ok(Stmt::While {
            condition,
            statements,
        })
    }

    /// `'RETURN' expression ';'`
    fn parse_return_statement(&mut self) -> Result<Stmt> {
        self.expect_literal("RETURN", "expected 'RETURN'")?;
        let value = self.parse_expression()?;
        self.expect_literal(";", "expected ';' after return value")?;
        Ok(Stmt::Return { value })
    }

    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_logical_expression()
    }

    fn parse_logical_expression(&mut self) -> Result<Expr> {
        let mut expr = self.parse_equality_expression()?;
        while let Some(op) = self.match_operator(&["AND", "OR", "&&", "||"]) {
            let right = self.parse_equality_expression()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_equality_expression(&mut self) -> Result<Expr> {
        let mut expr = self.parse_additive_expression()?;
        while let Some(op) = self.match_operator(&["<", "<=", ">", ">=", "==", "!="]) {
            let right = self.parse_additive_expression()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_additive_expression(&mut self) -> Result<Expr> {
        let mut expr = self.parse_multiplicative_expression()?;
        while let Some(op) = self.match_operator(&["+", "-"]) {
            let right = self.parse_multiplicative_expression()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expr> {
        let mut expr = self.parse_secondary_expression()?;
        while let Some(op) = self.match_operator(&["*", "/"]) {
            let right = self.parse_secondary_expression()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    /// `secondary ::= primary ('.' identifier ('(' arguments ')')?)*`
    fn parse_secondary_expression(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary_expression()?;
        while self.match_literal(".") {
            let name = self.expect_identifier("expected identifier after '.'")?;
            if self.match_literal("(") {
                let arguments = self.parse_arguments()?;
                expr = Expr::function(Some(expr), name, arguments);
            } else {
                expr = Expr::access(Some(expr), name);
            }
        }
        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> Result<Expr> {
        if self.match_literal("TRUE") {
            Ok(Expr::literal(Literal::Boolean(true)))
        } else if self.match_literal("FALSE") {
            Ok(Expr::literal(Literal::Boolean(false)))
        } else if self.match_literal("NIL") {
            Ok(Expr::literal(Literal::Nil))
        } else if self.match_kind(TokenKind::Integer) {
            let token = self.tokens.previous().expect("just matched");
            let value = token.literal.parse::<i64>().map_err(|_| {
                PlcError::parse(
                    format!("invalid integer literal: {}", token.literal),
                    token.index,
                )
            })?;
            Ok(Expr::literal(Literal::Integer(value)))
        } else if self.match_kind(TokenKind::Decimal) {
            let token = self.tokens.previous().expect("just matched");
            let value = token.literal.parse::<f64>().map_err(|_| {
                PlcError::parse(
                    format!("invalid decimal literal: {}", token.literal),
                    token.index,
                )
            })?;
            Ok(Expr::literal(Literal::Decimal(value)))
        } else if self.match_kind(TokenKind::Character) {
            let token = self.tokens.previous().expect("just matched");
            let raw = &token.literal[1..token.literal.len() - 1];
            let unescaped = unescape(raw);
            let mut chars = unescaped.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Expr::literal(Literal::Character(c))),
                _ => Err(PlcError::parse(
                    format!("invalid character literal: {}", token.literal),
                    token.index,
                )),
            }
        } else if self.match_kind(TokenKind::String) {
            let token = self.tokens.previous().expect("just matched");
            let raw = &token.literal[1..token.literal.len() - 1];
            Ok(Expr::literal(Literal::String(unescape(raw))))
        } else if self.match_literal("(") {
            let expression = self.parse_expression()?;
            self.expect_literal(")", "expected ')' after grouped expression")?;
            Ok(Expr::group(expression))
        } else if self.match_kind(TokenKind::Identifier) {
            let name = self.tokens.previous().expect("just matched").literal.clone();
            if self.match_literal("(") {
                let arguments = self.parse_arguments()?;
                Ok(Expr::function(None, name, arguments))
            } else {
                Ok(Expr::access(None, name))
            }
        } else {
            Err(PlcError::parse("expected an expression", self.error_index()))
        }
    }

    /// Arguments after a consumed `(`, through the closing `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut arguments = Vec::new();
        if self.match_literal(")") {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_expression()?);
            if !self.match_literal(",") {
                break;
            }
        }
        self.expect_literal(")", "expected ')' after arguments")?;
        Ok(arguments)
    }

    fn peek_literal(&self, literal: &str) -> bool {
        self.tokens.has(0) && self.tokens.get(0).literal == literal
    }

    fn match_literal(&mut self, literal: &str) -> bool {
        if self.peek_literal(literal) {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.tokens.has(0) && self.tokens.get(0).kind == kind {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    fn match_operator(&mut self, literals: &[&str]) -> Option<BinaryOp> {
        for literal in literals {
            if self.match_literal(literal) {
                return BinaryOp::from_literal(literal);
            }
        }
        None
    }

    fn expect_literal(&mut self, literal: &str, message: &str) -> Result<()> {
        if self.match_literal(literal) {
            Ok(())
        } else {
            Err(PlcError::parse(message, self.error_index()))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String> {
        if self.match_kind(TokenKind::Identifier) {
            Ok(self.tokens.previous().expect("just matched").literal.clone())
        } else {
            Err(PlcError::parse(message, self.error_index()))
        }
    }

    /// Errors point just past the last consumed token, or at the current one
    /// when nothing has been consumed yet.
    fn error_index(&self) -> usize {
        match self.tokens.previous() {
            Some(token) => token.end_index(),
            None if self.tokens.has(0) => self.tokens.get(0).index,
            None => 0,
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            // The lexer only emits literals with valid escapes.
            match chars.next() {
                Some('b') => out.push('\u{8}'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        TokenStream { tokens, index: 0 }
    }

    fn has(&self, offset: usize) -> bool {
        self.index + offset < self.tokens.len()
    }

    fn get(&self, offset: usize) -> &Token {
        &self.tokens[self.index + offset]
    }

    fn previous(&self) -> Option<&Token> {
        self.index.checked_sub(1).map(|i| &self.tokens[i])
    }

    fn advance(&mut self) {
        self.index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::Lexer;

    fn parse_source(input: &str) -> Result<Source> {
        Parser::new(Lexer::new(input).lex().unwrap()).parse_source()
    }

    fn parse_expr(input: &str) -> Expr {
        Parser::new(Lexer::new(input).lex().unwrap())
            .parse_expression()
            .unwrap()
    }

    fn parse_stmt(input: &str) -> Stmt {
        Parser::new(Lexer::new(input).lex().unwrap())
            .parse_statement()
            .unwrap()
    }

    #[test]
    fn test_source_fields_and_methods() {
        let source = parse_source("LET x: Integer;\nDEF main(): Integer DO RETURN 0; END").unwrap();
        assert_eq!(source.fields.len(), 1);
        assert_eq!(source.methods.len(), 1);
        assert_eq!(source.fields[0].name, "x");
        assert_eq!(source.fields[0].type_name, "Integer");
        assert_eq!(source.methods[0].name, "main");
        assert_eq!(
            source.methods[0].return_type_name.as_deref(),
            Some("Integer")
        );
    }

    #[test]
    fn test_const_field() {
        let source = parse_source("LET CONST limit: Integer = 10;").unwrap();
        assert!(source.fields[0].constant);
        assert!(source.fields[0].value.is_some());
    }

    #[test]
    fn test_method_parameters() {
        let source = parse_source("DEF square(num: Decimal): Decimal DO RETURN num * num; END")
            .unwrap();
        let method = &source.methods[0];
        assert_eq!(method.parameters, vec!["num"]);
        assert_eq!(method.parameter_type_names, vec!["Decimal"]);
        assert_eq!(method.statements.len(), 1);
    }

    #[test]
    fn test_source_rejects_stray_token() {
        assert!(parse_source("RETURN 0;").is_err());
    }

    #[test]
    fn test_declaration_statement() {
        match parse_stmt("LET name = 1.0;") {
            Stmt::Declaration {
                name,
                type_name,
                value,
                ..
            } => {
                assert_eq!(name, "name");
                assert!(type_name.is_none());
                assert_eq!(
                    value.unwrap(),
                    Expr::literal(Literal::Decimal(1.0))
                );
            }
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_statement() {
        match parse_stmt("num = num + 1;") {
            Stmt::Assignment { receiver, value } => {
                assert_eq!(receiver, Expr::access(None, "num"));
                assert!(matches!(value, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_semicolon() {
        let err = Parser::new(Lexer::new("print(0)").lex().unwrap())
            .parse_statement()
            .unwrap_err();
        match err {
            PlcError::Parse { index, .. } => assert_eq!(index, 8),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else() {
        match parse_stmt("IF TRUE DO print(1); ELSE print(0); END") {
            Stmt::If {
                then_statements,
                else_statements,
                ..
            } => {
                assert_eq!(then_statements.len(), 1);
                assert_eq!(else_statements.len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_all_clauses() {
        match parse_stmt("FOR (num = 0; num < 5; num = num + 1) print(num); END") {
            Stmt::For {
                initialization,
                increment,
                statements,
                ..
            } => {
                assert!(initialization.is_some());
                assert!(increment.is_some());
                assert_eq!(statements.len(), 1);
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_for_with_condition_only() {
        match parse_stmt("FOR (; num < 5;) print(num); END") {
            Stmt::For {
                initialization,
                increment,
                ..
            } => {
                assert!(initialization.is_none());
                assert!(increment.is_none());
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_while() {
        match parse_stmt("WHILE num < 10 DO num = num + 1; END") {
            Stmt::While { statements, .. } => assert_eq!(statements.len(), 1),
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_expr("NIL"), Expr::literal(Literal::Nil));
        assert_eq!(parse_expr("TRUE"), Expr::literal(Literal::Boolean(true)));
        assert_eq!(parse_expr("-42"), Expr::literal(Literal::Integer(-42)));
        assert_eq!(parse_expr("2.5"), Expr::literal(Literal::Decimal(2.5)));
        assert_eq!(parse_expr("'c'"), Expr::literal(Literal::Character('c')));
        assert_eq!(
            parse_expr(r#""Hello,\nWorld!""#),
            Expr::literal(Literal::String("Hello,\nWorld!".to_string()))
        );
    }

    #[test]
    fn test_operator_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match parse_expr("1 + 2 * 3") {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("expected additive at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_word_and_symbol_logical_operators() {
        let word = parse_expr("TRUE AND FALSE");
        let symbol = parse_expr("TRUE && FALSE");
        assert_eq!(word, symbol);
        assert!(matches!(word, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_left_associativity() {
        // a - b - c parses as (a - b) - c
        match parse_expr("a - b - c") {
            Expr::Binary {
                op: BinaryOp::Sub,
                left,
                ..
            } => assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. })),
            other => panic!("expected subtraction at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_group() {
        match parse_expr("(1 + 2) * 3") {
            Expr::Binary {
                op: BinaryOp::Mul,
                left,
                ..
            } => assert!(matches!(*left, Expr::Group { .. })),
            other => panic!("expected multiplication at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_function_call() {
        assert_eq!(
            parse_expr("f(1, 2)"),
            Expr::function(
                None,
                "f",
                vec![
                    Expr::literal(Literal::Integer(1)),
                    Expr::literal(Literal::Integer(2)),
                ]
            )
        );
        assert_eq!(parse_expr("f()"), Expr::function(None, "f", vec![]));
    }

    #[test]
    fn test_receiver_chain() {
        // obj.field.method(1)
        match parse_expr("obj.field.method(1)") {
            Expr::Function {
                receiver: Some(receiver),
                name,
                arguments,
                ..
            } => {
                assert_eq!(name, "method");
                assert_eq!(arguments.len(), 1);
                assert!(matches!(*receiver, Expr::Access { receiver: Some(_), .. }));
            }
            other => panic!("expected method call, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_group() {
        let result = Parser::new(Lexer::new("(1 + 2").lex().unwrap()).parse_expression();
        assert!(result.is_err());
    }
}
