use super::*;
use crate::test_helpers::{eval, public, run, Harness};
use crate::ExecErrorKind;
use lq_ast::{
    ActionStmt, AssignTarget, BinaryOp, Expr, IfBranch, LoopControl, LoopTerm, Select, SelectItem, SqlStatement,
    TableRef,
};
use lq_types::{ActionReturn, DataType, NamedType};
use lq_value::{ArrayValue, RecordValue};
use pretty_assertions::assert_eq;

fn declare(name: &str, data_type: DataType, init: Option<Expr>) -> ActionStmt {
    ActionStmt::Declare {
        name: name.to_string(),
        data_type,
        init,
    }
}

fn assign(name: &str, value: Expr) -> ActionStmt {
    ActionStmt::Assign {
        target: AssignTarget::Variable(name.to_string()),
        value,
    }
}

fn when(condition: Expr, then: Vec<ActionStmt>) -> ActionStmt {
    ActionStmt::If {
        branches: vec![IfBranch { condition, then }],
        otherwise: None,
    }
}

fn range(receiver: &str, start: i64, end: i64, body: Vec<ActionStmt>) -> ActionStmt {
    ActionStmt::ForLoop {
        receiver: receiver.to_string(),
        term: LoopTerm::Range {
            start: Expr::int(start),
            end: Expr::int(end),
        },
        body,
    }
}

fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::binary(op, left, right)
}

fn array(items: &[i64]) -> Expr {
    Expr::MakeArray(items.iter().copied().map(Expr::int).collect())
}

fn int_array(items: &[i64]) -> Value {
    Value::Array(ArrayValue::from_items(DataType::INT, items.iter().copied().map(Value::Int).collect()).unwrap())
}

mod expressions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derived_comparisons() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let cases = [
            (BinaryOp::NotEq, 1, 2, true),
            (BinaryOp::NotEq, 2, 2, false),
            (BinaryOp::LtEq, 2, 2, true),
            (BinaryOp::LtEq, 3, 2, false),
            (BinaryOp::GtEq, 2, 3, false),
            (BinaryOp::GtEq, 3, 3, true),
        ];
        for (op, a, b, expected) in cases {
            let result = eval(&mut ctx, &bin(op, Expr::int(a), Expr::int(b))).unwrap();
            assert_eq!(result, Value::Bool(expected), "{a} {op:?} {b}");
        }
    }

    #[test]
    fn comparison_with_null_is_null() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        for op in [BinaryOp::Eq, BinaryOp::NotEq, BinaryOp::LtEq, BinaryOp::GtEq] {
            let result = eval(&mut ctx, &bin(op, Expr::int(1), Expr::null())).unwrap();
            assert_eq!(result, Value::Null(DataType::BOOL), "{op:?}");
        }
    }

    #[test]
    fn logical_null_propagates() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let and = bin(BinaryOp::And, Expr::bool(true), Expr::null());
        assert_eq!(eval(&mut ctx, &and).unwrap(), Value::Null(DataType::BOOL));
        let or = bin(BinaryOp::Or, Expr::bool(false), Expr::bool(true));
        assert_eq!(eval(&mut ctx, &or).unwrap(), Value::Bool(true));
    }

    #[test]
    fn logical_requires_bool() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = eval(&mut ctx, &bin(BinaryOp::And, Expr::int(1), Expr::bool(true))).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::TypeMismatch {
                expected: "bool".to_string(),
                got: "int8".to_string(),
            }
        );
    }

    #[test]
    fn is_null_and_is_distinct() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let is = |left, right, not, distinct| Expr::Is {
            left: Box::new(left),
            right: Box::new(right),
            not,
            distinct,
        };
        assert_eq!(eval(&mut ctx, &is(Expr::null(), Expr::null(), false, false)).unwrap(), Value::Bool(true));
        assert_eq!(eval(&mut ctx, &is(Expr::int(1), Expr::null(), true, false)).unwrap(), Value::Bool(true));
        assert_eq!(eval(&mut ctx, &is(Expr::null(), Expr::int(1), false, true)).unwrap(), Value::Bool(true));
        assert_eq!(eval(&mut ctx, &is(Expr::int(1), Expr::int(1), true, true)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn mixed_kinds_need_a_cast() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let mixed = bin(BinaryOp::Add, Expr::int(1), Expr::text("2"));
        assert!(eval(&mut ctx, &mixed).is_err());
        let cast = bin(BinaryOp::Add, Expr::int(1), Expr::cast(Expr::text("2"), DataType::INT));
        assert_eq!(eval(&mut ctx, &cast).unwrap(), Value::Int(3));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = eval(&mut ctx, &bin(BinaryOp::Div, Expr::int(1), Expr::int(0))).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::Value(_)));
    }

    #[test]
    fn context_variables() {
        let mut harness = Harness::read_only();
        harness.tx.height = 42;
        let mut ctx = harness.ctx();
        assert_eq!(eval(&mut ctx, &Expr::var("@caller")).unwrap(), Value::text("owner"));
        assert_eq!(eval(&mut ctx, &Expr::var("@height")).unwrap(), Value::Int(42));
        assert_eq!(eval(&mut ctx, &Expr::var("@foreign_caller")).unwrap(), Value::text(""));
        let err = eval(&mut ctx, &Expr::var("@nope")).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::InvalidVariable {
                name: "@nope".to_string()
            }
        );
    }

    #[test]
    fn builtin_call() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let upper = Expr::call("UPPER", vec![Expr::text("abc")]);
        assert_eq!(eval(&mut ctx, &upper).unwrap(), Value::text("ABC"));
    }

    #[test]
    fn call_without_result_is_not_a_value() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = eval(&mut ctx, &Expr::call("notice", vec![Expr::text("x")])).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::NoReturnValues {
                name: "notice".to_string()
            }
        );
    }

    #[test]
    fn unknown_function() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = eval(&mut ctx, &Expr::call("nope", vec![])).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::UnknownAction {
                namespace: "main".to_string(),
                name: "nope".to_string(),
            }
        );
    }
}

mod arrays {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn index_is_one_based() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let second = Expr::index(array(&[10, 20, 30]), Expr::int(2));
        assert_eq!(eval(&mut ctx, &second).unwrap(), Value::Int(20));
        assert!(eval(&mut ctx, &Expr::index(array(&[10]), Expr::int(0))).is_err());
        assert!(eval(&mut ctx, &Expr::index(array(&[10]), Expr::int(2))).is_err());
    }

    #[test]
    fn null_index_is_rejected() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = eval(&mut ctx, &Expr::index(array(&[10]), Expr::null())).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::InvalidOperand { what: "array index", .. }));
    }

    #[test]
    fn slices_clamp() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let slice = |from: Option<i64>, to: Option<i64>| Expr::ArraySlice {
            array: Box::new(array(&[10, 20, 30])),
            from: from.map(|i| Box::new(Expr::int(i))),
            to: to.map(|i| Box::new(Expr::int(i))),
        };
        assert_eq!(eval(&mut ctx, &slice(Some(1), Some(2))).unwrap(), int_array(&[10, 20]));
        assert_eq!(eval(&mut ctx, &slice(Some(2), None)).unwrap(), int_array(&[20, 30]));
        assert_eq!(eval(&mut ctx, &slice(None, Some(9))).unwrap(), int_array(&[10, 20, 30]));
        assert_eq!(eval(&mut ctx, &slice(Some(3), Some(1))).unwrap(), int_array(&[]));
    }

    #[test]
    fn element_assignment_extends() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stmts = [
            declare("$a", DataType::INT_ARRAY, None),
            ActionStmt::Assign {
                target: AssignTarget::ArrayElement {
                    variable: "$a".to_string(),
                    index: Expr::int(3),
                },
                value: Expr::int(7),
            },
        ];
        run(&mut ctx, &stmts).unwrap();
        let Value::Array(a) = ctx.get_variable("$a").unwrap() else {
            panic!("$a holds an array");
        };
        assert_eq!(a.len(), 3);
        assert!(a.index(1).unwrap().is_null());
        assert_eq!(a.index(3).unwrap(), Value::Int(7));
    }

    #[test]
    fn element_assignment_past_max_length_fails() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stmts = [
            declare("$a", DataType::INT_ARRAY, Some(array(&[1]))),
            ActionStmt::Assign {
                target: AssignTarget::ArrayElement {
                    variable: "$a".to_string(),
                    index: Expr::int(i64::MAX),
                },
                value: Expr::int(5),
            },
        ];
        let err = run(&mut ctx, &stmts).unwrap_err();
        assert!(matches!(
            err.kind,
            ExecErrorKind::Value(lq_value::ValueError::ArrayTooLong { index: i64::MAX, .. })
        ));
        assert_eq!(ctx.get_variable("$a").unwrap(), int_array(&[1]));
    }

    #[test]
    fn element_assignment_needs_a_scalar() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stmts = [
            declare("$a", DataType::INT_ARRAY, Some(array(&[1]))),
            ActionStmt::Assign {
                target: AssignTarget::ArrayElement {
                    variable: "$a".to_string(),
                    index: Expr::int(1),
                },
                value: array(&[2]),
            },
        ];
        let err = run(&mut ctx, &stmts).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::InvalidOperand { what: "array element", .. }));
    }
}

mod statements {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn declaration_is_typed_null() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        run(&mut ctx, &[declare("$x", DataType::TEXT, None)]).unwrap();
        assert_eq!(ctx.get_variable("$x").unwrap(), Value::Null(DataType::TEXT));
    }

    #[test]
    fn declaration_initializer_must_match() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = run(&mut ctx, &[declare("$x", DataType::INT, Some(Expr::text("1")))]).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::TypeMismatch {
                expected: "int8".to_string(),
                got: "text".to_string(),
            }
        );
    }

    #[test]
    fn context_variables_are_read_only() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = run(&mut ctx, &[assign("@caller", Expr::text("me"))]).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::ReadOnlyVariable {
                name: "@caller".to_string()
            }
        );
    }

    #[test]
    fn if_takes_first_true_branch() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stmts = [
            declare("$x", DataType::INT, Some(Expr::int(0))),
            ActionStmt::If {
                branches: vec![
                    IfBranch {
                        condition: Expr::null(),
                        then: vec![assign("$x", Expr::int(1))],
                    },
                    IfBranch {
                        condition: Expr::bool(true),
                        then: vec![assign("$x", Expr::int(2))],
                    },
                    IfBranch {
                        condition: Expr::bool(true),
                        then: vec![assign("$x", Expr::int(3))],
                    },
                ],
                otherwise: Some(vec![assign("$x", Expr::int(4))]),
            },
        ];
        run(&mut ctx, &stmts).unwrap();
        assert_eq!(ctx.get_variable("$x").unwrap(), Value::Int(2));
    }

    #[test]
    fn if_condition_must_be_bool() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = run(&mut ctx, &[when(Expr::int(1), vec![])]).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn block_locals_do_not_leak() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        run(
            &mut ctx,
            &[when(Expr::bool(true), vec![declare("$inner", DataType::INT, None)])],
        )
        .unwrap();
        let err = ctx.get_variable("$inner").unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::UnknownVariable {
                name: "$inner".to_string()
            }
        );
    }

    #[test]
    fn return_stops_the_block() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stmts = [
            ActionStmt::ReturnNext(vec![Expr::int(1)]),
            ActionStmt::Return(vec![Expr::int(2)]),
            ActionStmt::ReturnNext(vec![Expr::int(3)]),
        ];
        let (signal, rows) = run(&mut ctx, &stmts).unwrap();
        assert_eq!(signal, ControlSignal::Return);
        assert_eq!(rows, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
    }

    #[test]
    fn embedded_sql_binds_variables() {
        let mut harness = Harness::read_write().with_users();
        let mut ctx = harness.ctx();
        let insert = SqlStatement::Insert(lq_ast::Insert {
            table: TableRef::new("users"),
            columns: Vec::new(),
            rows: vec![vec![
                lq_ast::SqlExpr::int(3),
                lq_ast::SqlExpr::var("$name"),
                lq_ast::SqlExpr::ContextVariable("@height".to_string()),
            ]],
        });
        let stmts = [
            declare("$name", DataType::TEXT, Some(Expr::text("Carol"))),
            ActionStmt::Sql(insert),
            ActionStmt::ReturnQuery(SqlStatement::Select(Select::new(
                vec![SelectItem::column("name")],
                TableRef::new("users"),
            ))),
        ];
        let (_, rows) = run(&mut ctx, &stmts).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::text("Alice")],
                vec![Value::text("Bob")],
                vec![Value::text("Carol")],
            ]
        );
    }

    #[test]
    fn mutating_sql_in_read_only_context() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let err = run(&mut ctx, &[ActionStmt::Sql(crate::test_helpers::insert_user(1, "A", 1))]).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::StatementMutatesState { statement: "INSERT" }
        );
    }
}

mod loops {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sum_with(body_prefix: Vec<ActionStmt>) -> Value {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let mut body = body_prefix;
        body.push(assign("$sum", bin(BinaryOp::Add, Expr::var("$sum"), Expr::var("$i"))));
        let stmts = [declare("$sum", DataType::INT, Some(Expr::int(0))), range("$i", 1, 5, body)];
        run(&mut ctx, &stmts).unwrap();
        ctx.get_variable("$sum").unwrap()
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(sum_with(vec![]), Value::Int(15));
    }

    #[test]
    fn break_ends_only_the_loop() {
        let stop = when(
            bin(BinaryOp::Eq, Expr::var("$i"), Expr::int(3)),
            vec![ActionStmt::LoopControl(LoopControl::Break)],
        );
        assert_eq!(sum_with(vec![stop]), Value::Int(3));
    }

    #[test]
    fn unbounded_range_stops_at_break() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stop = when(
            bin(BinaryOp::Eq, Expr::var("$i"), Expr::int(i64::MIN + 3)),
            vec![ActionStmt::LoopControl(LoopControl::Break)],
        );
        let count = assign("$n", bin(BinaryOp::Add, Expr::var("$n"), Expr::int(1)));
        let stmts = [
            declare("$n", DataType::INT, Some(Expr::int(0))),
            range("$i", i64::MIN, i64::MAX, vec![count, stop]),
            range("$j", 1, i64::MAX, vec![ActionStmt::LoopControl(LoopControl::Break)]),
        ];
        run(&mut ctx, &stmts).unwrap();
        assert_eq!(ctx.get_variable("$n").unwrap(), Value::Int(4));
    }

    #[test]
    fn continue_skips_an_iteration() {
        let even = bin(
            BinaryOp::Eq,
            bin(BinaryOp::Mod, Expr::var("$i"), Expr::int(2)),
            Expr::int(0),
        );
        let skip = when(even, vec![ActionStmt::LoopControl(LoopControl::Continue)]);
        assert_eq!(sum_with(vec![skip]), Value::Int(9));
    }

    #[test]
    fn empty_range_runs_nothing() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let (_, rows) = run(&mut ctx, &[range("$i", 3, 1, vec![ActionStmt::ReturnNext(vec![Expr::var("$i")])])]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn receiver_is_scoped_to_the_body() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        run(&mut ctx, &[range("$i", 1, 2, vec![])]).unwrap();
        assert!(ctx.get_variable("$i").is_err());
    }

    #[test]
    fn array_elements_in_order() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stmts = [ActionStmt::ForLoop {
            receiver: "$x".to_string(),
            term: LoopTerm::Array(array(&[3, 1, 2])),
            body: vec![ActionStmt::ReturnNext(vec![Expr::var("$x")])],
        }];
        let (_, rows) = run(&mut ctx, &stmts).unwrap();
        assert_eq!(rows, vec![vec![Value::Int(3)], vec![Value::Int(1)], vec![Value::Int(2)]]);
    }

    #[test]
    fn sql_rows_are_records() {
        let mut harness = Harness::read_write().with_users();
        let mut ctx = harness.ctx();
        let stmts = [ActionStmt::ForLoop {
            receiver: "$row".to_string(),
            term: LoopTerm::Sql(SqlStatement::Select(Select::new(
                vec![SelectItem::column("name"), SelectItem::column("age")],
                TableRef::new("users"),
            ))),
            body: vec![ActionStmt::ReturnNext(vec![
                Expr::field(Expr::var("$row"), "name"),
                Expr::field(Expr::var("$row"), "age"),
            ])],
        }];
        let (_, rows) = run(&mut ctx, &stmts).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::text("Alice"), Value::Int(30)],
                vec![Value::text("Bob"), Value::Int(25)],
            ]
        );
    }

    #[test]
    fn query_loop_skips_rows_its_body_inserts() {
        let mut harness = Harness::read_write().with_users();
        let mut ctx = harness.ctx();
        let insert = SqlStatement::Insert(lq_ast::Insert {
            table: TableRef::new("users"),
            columns: Vec::new(),
            rows: vec![vec![
                lq_ast::SqlExpr::binary(BinaryOp::Add, lq_ast::SqlExpr::var("$n"), lq_ast::SqlExpr::int(10)),
                lq_ast::SqlExpr::text("copy"),
                lq_ast::SqlExpr::int(1),
            ]],
        });
        let stmts = [
            declare("$n", DataType::INT, Some(Expr::int(0))),
            ActionStmt::ForLoop {
                receiver: "$row".to_string(),
                term: LoopTerm::Sql(SqlStatement::Select(Select::new(
                    vec![SelectItem::column("id")],
                    TableRef::new("users"),
                ))),
                body: vec![
                    assign("$n", bin(BinaryOp::Add, Expr::var("$n"), Expr::int(1))),
                    ActionStmt::Sql(insert),
                ],
            },
            ActionStmt::ReturnQuery(SqlStatement::Select(Select::new(
                vec![SelectItem::column("id")],
                TableRef::new("users"),
            ))),
        ];
        let (_, rows) = run(&mut ctx, &stmts).unwrap();
        assert_eq!(ctx.get_variable("$n").unwrap(), Value::Int(2));
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn return_inside_loop_stops_the_action() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let body = vec![
            ActionStmt::ReturnNext(vec![Expr::var("$i")]),
            when(
                bin(BinaryOp::Eq, Expr::var("$i"), Expr::int(2)),
                vec![ActionStmt::Return(vec![])],
            ),
        ];
        let (signal, rows) = run(&mut ctx, &[range("$i", 1, 5, body)]).unwrap();
        assert_eq!(signal, ControlSignal::Return);
        assert_eq!(rows, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
    }

    #[test]
    fn range_bounds_must_be_int() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let stmts = [ActionStmt::ForLoop {
            receiver: "$i".to_string(),
            term: LoopTerm::Range {
                start: Expr::int(1),
                end: Expr::null(),
            },
            body: vec![],
        }];
        let err = run(&mut ctx, &stmts).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::InvalidOperand { what: "range bound", .. }));
    }
}

mod calls {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair() -> lq_ast::ActionDef {
        public("pair")
            .returns(ActionReturn::values(vec![
                NamedType::new("a", DataType::INT),
                NamedType::new("b", DataType::TEXT),
            ]))
            .body(vec![ActionStmt::Return(vec![Expr::int(1), Expr::text("x")])])
    }

    fn two_rows() -> lq_ast::ActionDef {
        public("two_rows")
            .returns(ActionReturn::table(vec![NamedType::new("n", DataType::INT)]))
            .body(vec![
                ActionStmt::ReturnNext(vec![Expr::int(1)]),
                ActionStmt::ReturnNext(vec![Expr::int(2)]),
            ])
    }

    fn call_into(receivers: &[Option<&str>], name: &str) -> ActionStmt {
        ActionStmt::Call {
            receivers: receivers.iter().map(|r| r.map(str::to_string)).collect(),
            call: lq_ast::CallExpr::new(name, vec![]),
        }
    }

    #[test]
    fn receivers_bind_positionally() {
        let mut harness = Harness::read_write();
        harness.define(pair());
        let mut ctx = harness.ctx();
        run(&mut ctx, &[call_into(&[Some("$a"), Some("$b")], "pair")]).unwrap();
        assert_eq!(ctx.get_variable("$a").unwrap(), Value::Int(1));
        assert_eq!(ctx.get_variable("$b").unwrap(), Value::text("x"));
    }

    #[test]
    fn underscore_skips_a_column() {
        let mut harness = Harness::read_write();
        harness.define(pair());
        let mut ctx = harness.ctx();
        run(&mut ctx, &[call_into(&[None, Some("$b")], "pair")]).unwrap();
        assert_eq!(ctx.get_variable("$b").unwrap(), Value::text("x"));
        assert!(ctx.get_variable("$a").is_err());
    }

    #[test]
    fn too_many_receivers() {
        let mut harness = Harness::read_write();
        harness.define(pair());
        let mut ctx = harness.ctx();
        let err = run(&mut ctx, &[call_into(&[Some("$a"), Some("$b"), Some("$c")], "pair")]).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::ReturnArity {
                name: "pair".to_string(),
                expected: 3,
                got: 2,
            }
        );
    }

    #[test]
    fn receivers_need_exactly_one_row() {
        let mut harness = Harness::read_write();
        harness.define(two_rows());
        let mut ctx = harness.ctx();
        let err = run(&mut ctx, &[call_into(&[Some("$n")], "two_rows")]).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::RowCount {
                name: "two_rows".to_string(),
                got: 2,
            }
        );
    }

    #[test]
    fn row_count_resets_per_execution() {
        let mut harness = Harness::read_write();
        harness.define(pair());
        let mut ctx = harness.ctx();
        let stmts = [range("$i", 1, 3, vec![call_into(&[Some("$a")], "pair")])];
        run(&mut ctx, &stmts).unwrap();
    }

    #[test]
    fn loop_over_call_rows() {
        let mut harness = Harness::read_write();
        harness.define(two_rows());
        let mut ctx = harness.ctx();
        let stmts = [ActionStmt::ForLoop {
            receiver: "$row".to_string(),
            term: LoopTerm::Call(lq_ast::CallExpr::new("two_rows", vec![])),
            body: vec![ActionStmt::ReturnNext(vec![Expr::field(Expr::var("$row"), "n")])],
        }];
        let (_, rows) = run(&mut ctx, &stmts).unwrap();
        assert_eq!(rows, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
    }

    #[test]
    fn call_without_receivers_discards_rows() {
        let mut harness = Harness::read_write();
        harness.define(two_rows());
        let mut ctx = harness.ctx();
        let (_, rows) = run(&mut ctx, &[call_into(&[], "two_rows")]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn field_access_on_records() {
        let mut harness = Harness::read_only();
        let mut ctx = harness.ctx();
        let mut record = RecordValue::new();
        record.add_field("id", Value::Int(5)).unwrap();
        ctx.allocate_variable("$r", Value::Record(record)).unwrap();
        assert_eq!(eval(&mut ctx, &Expr::field(Expr::var("$r"), "id")).unwrap(), Value::Int(5));
        let err = eval(&mut ctx, &Expr::field(Expr::var("$r"), "nope")).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::UnknownField {
                field: "nope".to_string()
            }
        );
    }
}
