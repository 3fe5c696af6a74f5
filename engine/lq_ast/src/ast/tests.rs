use super::*;
use crate::{ActionDef, BinaryOp};
use lq_types::{ActionModifiers, DataType, Privilege};
use pretty_assertions::assert_eq;

mod sql {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn select_does_not_mutate() {
        let select = SqlStatement::Select(Select::new(
            vec![SelectItem::Wildcard],
            TableRef::new("users"),
        ));
        assert!(!select.mutates());
        assert_eq!(select.table().name, "users");
    }

    #[test]
    fn writes_mutate() {
        let delete = SqlStatement::Delete(Delete {
            table: TableRef::new("users"),
            filter: None,
        });
        assert!(delete.mutates());
    }

    #[test]
    fn qualify_table_in_place() {
        let mut delete = SqlStatement::Delete(Delete {
            table: TableRef::new("users"),
            filter: None,
        });
        delete.table_mut().namespace = Some("main".to_string());
        assert_eq!(delete.table(), &TableRef::qualified("main", "users"));
    }

    #[test]
    fn primary_key_implies_not_null() {
        let column = ColumnDef::new("id", DataType::INT).primary_key();
        assert!(column.not_null);
    }
}

mod top_level {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ddl_always_mutates() {
        let kind = TopLevelKind::CreateNamespace {
            name: "app".to_string(),
            if_not_exists: false,
        };
        assert!(kind.mutates());
        assert_eq!(kind.name(), "CREATE NAMESPACE");
    }

    #[test]
    fn revoke_name() {
        let kind = TopLevelKind::GrantPrivileges {
            grant: false,
            privileges: vec![Privilege::Select],
            namespace: None,
            role: "reader".to_string(),
        };
        assert_eq!(kind.name(), "REVOKE");
    }

    #[test]
    fn namespace_prefix() {
        let action = ActionDef::new("noop").modifiers(ActionModifiers::PUBLIC);
        let statement = TopLevelStatement::new(TopLevelKind::CreateAction {
            action,
            or_replace: false,
            if_not_exists: false,
        })
        .in_namespace("app");
        assert_eq!(statement.namespace.as_deref(), Some("app"));
    }
}

mod expressions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builders_nest() {
        let expr = Expr::binary(BinaryOp::Add, Expr::var("$a"), Expr::int(1));
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(*left, Expr::Variable("$a".to_string()));
    }

    #[test]
    fn operator_classes() {
        assert!(BinaryOp::LtEq.is_comparison());
        assert!(BinaryOp::Or.is_logical());
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert_eq!(BinaryOp::Concat.as_symbol(), "||");
    }
}
