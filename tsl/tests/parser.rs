// tests/parser.rs

use tsl::ast::{
    BinaryExpr, BinaryOp, CallExpr, Expression, FieldExpr, IfExpr, LetExpr, Literal, UnaryExpr,
    UnaryOp,
};
use tsl::parser::{parse_expression, parse_program};

// Helper macro for asserting expression parsing
macro_rules! assert_expr_parses_to {
    ($input:expr, $expected:expr) => {
        let ast_result = parse_expression($input);
        assert!(
            ast_result.is_ok(),
            "Failed to build expression (parse_expression):\nInput: {:?}\nError: {:?}",
            $input,
            ast_result.err().unwrap()
        );
        let ast = ast_result.unwrap();
        if ast != $expected {
            // Use pretty assert for better diffs
            pretty_assertions::assert_eq!(
                ast,
                $expected,
                "Expression AST mismatch for input: {:?}",
                $input
            );
        }
    };
}

fn lit_int(i: i64) -> Expression {
    Expression::Literal(Literal::Integer(i))
}

fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_string())
}

fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

#[test]
fn test_parse_simple_literals() {
    assert_expr_parses_to!("123", lit_int(123));
    assert_expr_parses_to!("1.23", Expression::Literal(Literal::Float(1.23)));
    assert_expr_parses_to!("2e3", Expression::Literal(Literal::Float(2000.0)));
    assert_expr_parses_to!(
        r#""hello""#,
        Expression::Literal(Literal::String("hello".to_string()))
    );
    assert_expr_parses_to!(
        r#""line\nbreak""#,
        Expression::Literal(Literal::String("line\nbreak".to_string()))
    );
    assert_expr_parses_to!("true", Expression::Literal(Literal::Boolean(true)));
    assert_expr_parses_to!("false", Expression::Literal(Literal::Boolean(false)));
    assert_expr_parses_to!("null", Expression::Literal(Literal::Null));
}

#[test]
fn test_negative_numbers_are_unary() {
    assert_expr_parses_to!(
        "-45",
        Expression::Unary(UnaryExpr {
            op: UnaryOp::Neg,
            operand: Box::new(lit_int(45)),
        })
    );
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert!(parse_expression("null").is_ok());
    // A keyword prefix still makes a valid identifier.
    assert_expr_parses_to!("nullable", ident("nullable"));
    assert_expr_parses_to!("dot", ident("dot"));
    assert_expr_parses_to!("inner", ident("inner"));
}

#[test]
fn test_precedence_and_associativity() {
    // 1 + 2 * 3 groups the multiplication first.
    assert_expr_parses_to!(
        "1 + 2 * 3",
        binary(
            BinaryOp::Add,
            lit_int(1),
            binary(BinaryOp::Mul, lit_int(2), lit_int(3))
        )
    );
    // Subtraction is left-associative.
    assert_expr_parses_to!(
        "1 - 2 - 3",
        binary(
            BinaryOp::Sub,
            binary(BinaryOp::Sub, lit_int(1), lit_int(2)),
            lit_int(3)
        )
    );
    // Comparison binds tighter than equality, equality tighter than &&.
    assert_expr_parses_to!(
        "a < 1 == b > 2 && c",
        binary(
            BinaryOp::And,
            binary(
                BinaryOp::Eq,
                binary(BinaryOp::Lt, ident("a"), lit_int(1)),
                binary(BinaryOp::Gt, ident("b"), lit_int(2))
            ),
            ident("c")
        )
    );
    // Parentheses override grouping.
    assert_expr_parses_to!(
        "(1 + 2) * 3",
        binary(
            BinaryOp::Mul,
            binary(BinaryOp::Add, lit_int(1), lit_int(2)),
            lit_int(3)
        )
    );
}

#[test]
fn test_field_and_index_access_chain() {
    assert_expr_parses_to!(
        "a.x",
        Expression::Field(FieldExpr {
            object: Box::new(ident("a")),
            field: "x".to_string(),
        })
    );
    let mut expected = Expression::Field(FieldExpr {
        object: Box::new(ident("a")),
        field: "x".to_string(),
    });
    expected = Expression::Index(tsl::ast::IndexExpr {
        object: Box::new(expected),
        index: Box::new(lit_int(0)),
    });
    expected = Expression::Field(FieldExpr {
        object: Box::new(expected),
        field: "y".to_string(),
    });
    assert_expr_parses_to!("a.x[0].y", expected);
}

#[test]
fn test_object_and_array_construction() {
    assert_expr_parses_to!(
        "{x: 1, \"two words\": 2}",
        Expression::Object(vec![
            ("x".to_string(), lit_int(1)),
            ("two words".to_string(), lit_int(2)),
        ])
    );
    assert_expr_parses_to!("{}", Expression::Object(vec![]));
    assert_expr_parses_to!("[1, 2, 3]", Expression::Array(vec![lit_int(1), lit_int(2), lit_int(3)]));
    assert_expr_parses_to!("[]", Expression::Array(vec![]));
    // Trailing commas are accepted.
    assert_expr_parses_to!("[1, 2,]", Expression::Array(vec![lit_int(1), lit_int(2)]));
}

#[test]
fn test_if_and_let_expressions() {
    assert_expr_parses_to!(
        "if a then 1 else 2",
        Expression::If(IfExpr {
            condition: Box::new(ident("a")),
            then_branch: Box::new(lit_int(1)),
            else_branch: Box::new(lit_int(2)),
        })
    );
    assert_expr_parses_to!(
        "let x = 1 in x",
        Expression::Let(LetExpr {
            name: "x".to_string(),
            value: Box::new(lit_int(1)),
            body: Box::new(ident("x")),
        })
    );
}

#[test]
fn test_capability_call_argument_is_postfix() {
    assert_expr_parses_to!(
        "do \"cap.echo\" {x: 1}",
        Expression::Call(CallExpr {
            capability: "cap.echo".to_string(),
            argument: Box::new(Expression::Object(vec![("x".to_string(), lit_int(1))])),
        })
    );
    // The comparison applies to the call result, not the argument.
    assert_expr_parses_to!(
        "do \"cap.echo\" {} == 1",
        binary(
            BinaryOp::Eq,
            Expression::Call(CallExpr {
                capability: "cap.echo".to_string(),
                argument: Box::new(Expression::Object(vec![])),
            }),
            lit_int(1)
        )
    );
}

#[test]
fn test_program_rounds_and_score() {
    let program = parse_program(
        "# trust bootstrap\n\
         plan a = do \"cap.echo\" {x: 1} in\n\
         then b = do \"cap.echo\" {x: 1} in\n\
         if a.x == b.x then 1.0 else 0.0",
    )
    .expect("program should parse");
    assert_eq!(program.rounds.len(), 2);
    assert_eq!(program.rounds[0].bindings[0].name, "a");
    assert_eq!(program.rounds[1].bindings[0].name, "b");
    assert!(matches!(program.score, Expression::If(_)));
}

#[test]
fn test_program_multiple_bindings_per_round() {
    let program = parse_program(
        "plan a = 1 in b = 2 in then c = 3 in d = 4 in a + b + c + d",
    )
    .expect("program should parse");
    assert_eq!(program.rounds.len(), 2);
    assert_eq!(
        program.rounds[0]
            .bindings
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    assert_eq!(
        program.rounds[1]
            .bindings
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>(),
        vec!["c", "d"]
    );
}

#[test]
fn test_score_only_program() {
    let program = parse_program("0.8").expect("constant program should parse");
    assert!(program.rounds.is_empty());
    assert_eq!(program.score, Expression::Literal(Literal::Float(0.8)));
}

#[test]
fn test_binding_value_may_contain_if_with_then() {
    // `then` inside an if expression does not open a new round.
    let program = parse_program(
        "plan a = if true then 1 else 2 in then b = 3 in a + b",
    )
    .expect("program should parse");
    assert_eq!(program.rounds.len(), 2);
}

#[test]
fn test_parse_errors_report_position() {
    let err = parse_expression("1 +").unwrap_err();
    assert!(err.line >= 1);

    assert!(parse_program("plan a = 1 in").is_err());
    assert!(parse_expression("{x 1}").is_err());
    assert!(parse_expression("do \"cap\"").is_err());
}

#[test]
fn test_whole_input_must_be_consumed() {
    assert!(parse_expression("1 2").is_err());
    assert!(parse_program("1.0 trailing").is_err());
}
