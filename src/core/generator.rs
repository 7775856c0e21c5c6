use crate::domain::ast::{Expr, Field, Literal, Method, Source, Stmt};
use crate::utils::error::{PlcError, Result};
use std::fmt::Write;

/// Emits Java source for an analyzed AST.
///
/// The program becomes a `Main` class whose static `main` delegates to the
/// generated instance `main()`, so the PLC exit value becomes the process
/// exit code. Requires the analyzer to have annotated the tree first.
pub struct Generator {
    output: String,
    indent: usize,
}

pub fn generate(source: &Source) -> Result<String> {
    let mut generator = Generator::new();
    generator.source(source)?;
    Ok(generator.output)
}

impl Generator {
    fn new() -> Self {
        Generator {
            output: String::new(),
            indent: 0,
        }
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_str(text)?;
        Ok(())
    }

    fn newline(&mut self, indent: usize) -> Result<()> {
        self.output.write_char('\n')?;
        for _ in 0..indent {
            self.output.write_str("    ")?;
        }
        Ok(())
    }

    fn source(&mut self, source: &Source) -> Result<()> {
        self.write("public class Main {")?;
        self.newline(0)?;
        self.indent += 1;

        if !source.fields.is_empty() {
            for field in &source.fields {
                self.newline(self.indent)?;
                self.field(field)?;
            }
            self.newline(0)?;
        }

        self.newline(self.indent)?;
        self.write("public static void main(String[] args) {")?;
        self.indent += 1;
        self.newline(self.indent)?;
        self.write("System.exit(new Main().main());")?;
        self.indent -= 1;
        self.newline(self.indent)?;
        self.write("}")?;
        self.newline(0)?;

        for method in &source.methods {
            self.newline(self.indent)?;
            self.method(method)?;
            self.newline(0)?;
        }

        self.indent -= 1;
        self.newline(self.indent)?;
        self.write("}")
    }

    fn field(&mut self, field: &Field) -> Result<()> {
        let variable = field
            .variable
            .as_ref()
            .ok_or_else(|| PlcError::analysis("field has not been analyzed"))?;
        if variable.constant {
            self.write("final ")?;
        }
        self.write(variable.ty.jvm_name())?;
        self.write(" ")?;
        self.write(&variable.jvm_name)?;
        if let Some(value) = &field.value {
            self.write(" = ")?;
            self.expression(value)?;
        }
        self.write(";")
    }

    fn method(&mut self, method: &Method) -> Result<()> {
        let function = method
            .function
            .as_ref()
            .ok_or_else(|| PlcError::analysis("method has not been analyzed"))?
            .clone();
        self.write(function.return_type.jvm_name())?;
        self.write(" ")?;
        self.write(&function.jvm_name)?;
        self.write("(")?;
        for (i, (parameter, ty)) in method
            .parameters
            .iter()
            .zip(&function.parameter_types)
            .enumerate()
        {
            if i != 0 {
                self.write(", ")?;
            }
            self.write(ty.jvm_name())?;
            self.write(" ")?;
            self.write(parameter)?;
        }
        self.write(") {")?;
        self.block(&method.statements)?;
        self.write("}")
    }

    /// Writes an indented statement block between the caller's braces, or
    /// nothing at all so empty bodies render as `{}`.
    fn block(&mut self, statements: &[Stmt]) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }
        self.indent += 1;
        for statement in statements {
            self.newline(self.indent)?;
            self.statement(statement)?;
        }
        self.indent -= 1;
        self.newline(self.indent)
    }

    fn statement(&mut self, statement: &Stmt) -> Result<()> {
        match statement {
            Stmt::Expression { expression } => {
                self.expression(expression)?;
                self.write(";")
            }
            Stmt::Declaration {
                variable, value, ..
            } => {
                let variable = variable
                    .as_ref()
                    .ok_or_else(|| PlcError::analysis("declaration has not been analyzed"))?
                    .clone();
                self.write(variable.ty.jvm_name())?;
                self.write(" ")?;
                self.write(&variable.jvm_name)?;
                if let Some(value) = value {
                    self.write(" = ")?;
                    self.expression(value)?;
                }
                self.write(";")
            }
            Stmt::Assignment { receiver, value } => {
                self.expression(receiver)?;
                self.write(" = ")?;
                self.expression(value)?;
                self.write(";")
            }
            Stmt::If {
                condition,
                then_statements,
                else_statements,
            } => {
                self.write("if (")?;
                self.expression(condition)?;
                self.write(") {")?;
                self.block(then_statements)?;
                self.write("}")?;
                if !else_statements.is_empty() {
                    self.write(" else {")?;
                    self.block(else_statements)?;
                    self.write("}")?;
                }
                Ok(())
            }
            Stmt::For {
                initialization,
                condition,
                increment,
                statements,
            } => {
                self.write("for ( ")?;
                match initialization {
                    Some(initialization) => self.statement(initialization)?,
                    None => self.write(";")?,
                }
                self.write(" ")?;
                self.expression(condition)?;
                self.write(";")?;
                if let Some(increment) = increment {
                    let Stmt::Assignment { receiver, value } = increment.as_ref() else {
                        return Err(PlcError::analysis("for increment must be an assignment"));
                    };
                    self.write(" ")?;
                    self.expression(receiver)?;
                    self.write(" = ")?;
                    self.expression(value)?;
                }
                self.write(" ) {")?;
                self.block(statements)?;
                self.write("}")
            }
            Stmt::While {
                condition,
                statements,
            } => {
                self.write("while (")?;
                self.expression(condition)?;
                self.write(") {")?;
                self.block(statements)?;
                self.write("}")
            }
            Stmt::Return { value } => {
                self.write("return ")?;
                self.expression(value)?;
                self.write(";")
            }
        }
    }

    fn expression(&mut self, expression: &Expr) -> Result<()> {
        match expression {
            Expr::Literal { value, .. } => self.literal(value),
            Expr::Group { expression, .. } => {
                self.write("(")?;
                self.expression(expression)?;
                self.write(")")
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                self.expression(left)?;
                self.write(" ")?;
                self.write(op.jvm_symbol())?;
                self.write(" ")?;
                self.expression(right)?;
                Ok(())
            }
            Expr::Access {
                receiver, variable, ..
            } => {
                if let Some(receiver) = receiver {
                    self.expression(receiver)?;
                    self.write(".")?;
                }
                let variable = variable
                    .as_ref()
                    .ok_or_else(|| PlcError::analysis("access has not been analyzed"))?
                    .clone();
                self.write(&variable.jvm_name)
            }
            Expr::Function {
                receiver,
                arguments,
                function,
                ..
            } => {
                if let Some(receiver) = receiver {
                    self.expression(receiver)?;
                    self.write(".")?;
                }
                let function = function
                    .as_ref()
                    .ok_or_else(|| PlcError::analysis("call has not been analyzed"))?
                    .clone();
                self.write(&function.jvm_name)?;
                self.write("(")?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i != 0 {
                        self.write(", ")?;
                    }
                    self.expression(argument)?;
                }
                self.write(")")
            }
        }
    }

    fn literal(&mut self, literal: &Literal) -> Result<()> {
        match literal {
            Literal::Nil => self.write("null"),
            Literal::Boolean(b) => self.write(if *b { "true" } else { "false" }),
            Literal::Integer(i) => {
                let text = i.to_string();
                self.write(&text)
            }
            Literal::Decimal(d) => {
                // `{:?}` keeps the trailing zero, 1.0 rather than 1.
                let text = format!("{:?}", d);
                self.write(&text)
            }
            Literal::Character(c) => {
                self.write("'")?;
                let escaped = escape_char(*c);
                self.write(&escaped)?;
                self.write("'")
            }
            Literal::String(s) => {
                self.write("\"")?;
                let escaped: String = s.chars().map(escape_char).collect();
                self.write(&escaped)?;
                self.write("\"")
            }
        }
    }
}

/// Escapes a character for inclusion in a Java literal, undoing the
/// unescaping the parser applied.
fn escape_char(c: char) -> String {
    match c {
        '\\' => "\\\\".to_string(),
        '\u{8}' => "\\b".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        '\'' => "\\'".to_string(),
        '"' => "\\\"".to_string(),
        _ => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analyzer::Analyzer;
    use crate::core::lexer::Lexer;
    use crate::core::parser::Parser;

    fn generate_source(input: &str) -> String {
        let mut source = Parser::new(Lexer::new(input).lex().unwrap())
            .parse_source()
            .unwrap();
        Analyzer::new().analyze(&mut source).unwrap();
        generate(&source).unwrap()
    }

    #[test]
    fn test_hello_world() {
        let java = generate_source(
            "DEF main(): Integer DO\n    print(\"Hello, World!\");\n    RETURN 0;\nEND",
        );
        assert_eq!(
            java,
            "public class Main {\n\
             \n\
             \x20   public static void main(String[] args) {\n\
             \x20       System.exit(new Main().main());\n\
             \x20   }\n\
             \n\
             \x20   int main() {\n\
             \x20       System.out.println(\"Hello, World!\");\n\
             \x20       return 0;\n\
             \x20   }\n\
             \n\
             }"
        );
    }

    #[test]
    fn test_fields_render_before_main() {
        let java = generate_source(
            "LET x: Integer;\nLET CONST y: Decimal = 1.0;\nDEF main(): Integer DO RETURN 0; END",
        );
        assert!(java.contains("    int x;\n"));
        assert!(java.contains("    final double y = 1.0;\n"));
        let fields = java.find("int x").unwrap();
        let main = java.find("public static void main").unwrap();
        assert!(fields < main);
    }

    #[test]
    fn test_method_signature_with_parameters() {
        let java = generate_source(
            "DEF func(x: Integer, y: Decimal, z: String) DO END\nDEF main(): Integer DO RETURN 0; END",
        );
        assert!(java.contains("    Void func(int x, double y, String z) {}\n"));
    }

    #[test]
    fn test_if_else() {
        let java = generate_source(
            "DEF main(): Integer DO\n    IF TRUE DO\n        print(1);\n    ELSE\n        print(0);\n    END\n    RETURN 0;\nEND",
        );
        assert!(java.contains(
            "if (true) {\n\
             \x20           System.out.println(1);\n\
             \x20       } else {\n\
             \x20           System.out.println(0);\n\
             \x20       }"
        ));
    }

    #[test]
    fn test_for_loop_spacing() {
        let java = generate_source(
            "DEF main(): Integer DO\n    LET num = 0;\n    FOR (num = 0; num < 5; num = num + 1)\n        print(num);\n    END\n    RETURN 0;\nEND",
        );
        assert!(java.contains("for ( num = 0; num < 5; num = num + 1 ) {"));
    }

    #[test]
    fn test_for_loop_without_clauses() {
        let java = generate_source(
            "DEF main(): Integer DO\n    LET num = 0;\n    FOR (; num < 5;)\n        num = num + 1;\n    END\n    RETURN num;\nEND",
        );
        assert!(java.contains("for ( ; num < 5; ) {"));
    }

    #[test]
    fn test_while_loop() {
        let java = generate_source(
            "DEF main(): Integer DO\n    WHILE FALSE DO\n        print(0);\n    END\n    RETURN 0;\nEND",
        );
        assert!(java.contains("while (false) {"));
    }

    #[test]
    fn test_logical_operators_lower_to_java() {
        let java = generate_source(
            "DEF main(): Integer DO\n    IF TRUE AND FALSE OR TRUE DO\n        print(0);\n    END\n    RETURN 0;\nEND",
        );
        assert!(java.contains("if (true && false || true) {"));
    }

    #[test]
    fn test_literals_are_reescaped() {
        let java = generate_source(
            "DEF main(): Integer DO\n    print(\"Line1\\nLine2\\t\\\"done\\\"\");\n    RETURN 0;\nEND",
        );
        assert!(java.contains("System.out.println(\"Line1\\nLine2\\t\\\"done\\\"\");"));
    }

    #[test]
    fn test_character_literal() {
        let java = generate_source(
            "LET c: Character = '\\n';\nDEF main(): Integer DO RETURN 0; END",
        );
        assert!(java.contains("char c = '\\n';"));
    }

    #[test]
    fn test_group_and_binary() {
        let java = generate_source(
            "LET x: Integer = (1 + 2) * 3;\nDEF main(): Integer DO RETURN x; END",
        );
        assert!(java.contains("int x = (1 + 2) * 3;"));
        assert!(java.contains("return x;"));
    }

    #[test]
    fn test_unanalyzed_tree_is_rejected() {
        let source = Parser::new(Lexer::new("DEF main(): Integer DO RETURN 0; END").lex().unwrap())
            .parse_source()
            .unwrap();
        assert!(generate(&source).is_err());
    }
}
