mod common;

use std::sync::Arc;

use anyhow::Result;
use monk_callbacks::{CallbackError, DbError, LogLevel, Operation, Statement};
use parking_lot::Mutex;

type Trail = Arc<Mutex<Vec<&'static str>>>;

fn mark(trail: &Trail, label: &'static str) -> impl Fn(&mut Statement) -> Result<(), DbError> + Send + Sync {
    let trail = Arc::clone(trail);
    move |_: &mut Statement| {
        trail.lock().push(label);
        Ok(())
    }
}

#[test]
fn validate_save_log_runs_in_declared_order() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let create = t.db.callbacks().create();

    create.register("validate", mark(&trail, "h1"))?;
    create.after("validate").register("save", mark(&trail, "h2"))?;
    create.after("save").register("log", mark(&trail, "h3"))?;

    let mut stmt = t.db.statement(Operation::Create);
    assert!(t.db.execute(&mut stmt).success);
    assert_eq!(*trail.lock(), vec!["h1", "h2", "h3"]);
    Ok(())
}

#[test]
fn before_places_ahead_of_existing() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let query = t.db.callbacks().query();

    query.register("a", mark(&trail, "h1"))?;
    query.before("a").register("b", mark(&trail, "h2"))?;

    assert_eq!(query.callback_names(), vec!["b", "a"]);
    let mut stmt = t.db.statement(Operation::Query);
    t.db.execute(&mut stmt);
    assert_eq!(*trail.lock(), vec!["h2", "h1"]);
    Ok(())
}

#[test]
fn removed_callback_still_anchors_after() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let update = t.db.callbacks().update();

    update.register("a", mark(&trail, "h1"))?;
    update.remove("a")?;
    update.after("a").register("b", mark(&trail, "h2"))?;

    let mut stmt = t.db.statement(Operation::Update);
    t.db.execute(&mut stmt);
    assert_eq!(*trail.lock(), vec!["h2"]);
    assert!(!t.logger.messages_at(LogLevel::Warn).is_empty(), "removal is announced");
    Ok(())
}

#[test]
fn replace_takes_over_the_slot() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let delete = t.db.callbacks().delete();

    delete.register("before", mark(&trail, "before"))?;
    delete.register("n", mark(&trail, "h1"))?;
    delete.after("n").register("after", mark(&trail, "after"))?;
    delete.replace("n", mark(&trail, "h2"))?;

    let mut stmt = t.db.statement(Operation::Delete);
    t.db.execute(&mut stmt);
    assert_eq!(*trail.lock(), vec!["before", "h2", "after"]);

    let replacing = t.logger.messages_at(LogLevel::Info);
    assert!(replacing.iter().any(|m| m.contains("replacing callback `n`")), "{replacing:?}");
    Ok(())
}

#[test]
fn ghost_constraint_is_a_no_op() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let row = t.db.callbacks().row();

    row.register("a", mark(&trail, "a"))?;
    row.before("ghost").register("b", mark(&trail, "b"))?;
    row.after("phantom").register("c", mark(&trail, "c"))?;

    assert_eq!(row.callback_names(), vec!["a", "b", "c"]);
    Ok(())
}

#[test]
fn direct_cycle_is_reported_and_previous_list_kept() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let raw = t.db.callbacks().raw();

    raw.before("b").register("a", mark(&trail, "a"))?;
    let err = raw.before("a").register("b", mark(&trail, "b")).unwrap_err();

    assert!(matches!(err, CallbackError::Conflict { .. }), "{err}");
    assert_eq!(raw.callback_names(), vec!["a"]);
    let errors = t.logger.messages_at(LogLevel::Error);
    assert!(errors.iter().any(|m| m.contains("conflicting callback")), "{errors:?}");
    Ok(())
}

#[test]
fn duplicate_registration_warns_with_location() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let create = t.db.callbacks().create();

    create.register("dup", mark(&trail, "first"))?;
    create.register("dup", mark(&trail, "second"))?;

    let warnings = t.logger.messages_at(LogLevel::Warn);
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("duplicated callback `dup`"));
    assert!(warnings[0].contains("10_callback_ordering.rs"), "{}", warnings[0]);

    // the newest declaration resolves the name
    let mut stmt = t.db.statement(Operation::Create);
    t.db.execute(&mut stmt);
    assert_eq!(*trail.lock(), vec!["second"]);
    Ok(())
}

#[test]
fn recompiling_is_deterministic() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let create = t.db.callbacks().create();

    create.register("begin", mark(&trail, "begin"))?;
    create.after("begin").register("save", mark(&trail, "save"))?;
    create.before("save").register("validate", mark(&trail, "validate"))?;
    create.after("save").register("commit", mark(&trail, "commit"))?;
    create.remove("validate")?;
    create.replace("save", mark(&trail, "save2"))?;

    let first = create.callback_names();
    create.compile()?;
    assert_eq!(create.callback_names(), first);
    assert_eq!(first, vec!["begin", "save", "commit"]);

    let mut stmt = t.db.statement(Operation::Create);
    t.db.execute(&mut stmt);
    assert_eq!(*trail.lock(), vec!["begin", "save2", "commit"]);
    Ok(())
}

#[test]
fn handles_are_isolated() -> Result<()> {
    let one = common::bare_db();
    let two = common::bare_db();
    let trail = Trail::default();

    one.db.callbacks().create().register("only_here", mark(&trail, "x"))?;
    assert_eq!(one.db.callbacks().create().callback_names(), vec!["only_here"]);
    assert!(two.db.callbacks().create().callback_names().is_empty());
    Ok(())
}

#[test]
fn constraints_hold_when_targets_arrive_later() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let query = t.db.callbacks().query();

    query.register("a", mark(&trail, "a"))?;
    query.register("c", mark(&trail, "c"))?;
    query.before("d").register("e", mark(&trail, "e"))?;
    query.before("c").after("b").register("d", mark(&trail, "d"))?;
    query.register("b", mark(&trail, "b"))?;
    assert_eq!(query.callback_names(), vec!["a", "e", "b", "d", "c"]);

    let update = t.db.callbacks().update();
    update.register("c", mark(&trail, "c"))?;
    update.before("e").register("b", mark(&trail, "b"))?;
    update.register("e", mark(&trail, "e"))?;
    update.before("c").after("b").register("d", mark(&trail, "d"))?;
    assert_eq!(update.callback_names(), vec!["b", "e", "d", "c"]);
    Ok(())
}

#[test]
fn cycle_through_several_callbacks_is_rejected() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let create = t.db.callbacks().create();

    create.before("d").register("a", mark(&trail, "a"))?;
    create.before("d").register("c", mark(&trail, "c"))?;
    create.before("c").after("b").register("e", mark(&trail, "e"))?;
    create.before("b").register("d", mark(&trail, "d"))?;
    let err = create.register("b", mark(&trail, "b")).unwrap_err();

    assert!(err.is_conflict(), "{err}");
    assert_eq!(create.callback_names(), vec!["a", "e", "c", "d"]);
    Ok(())
}

#[test]
fn self_reference_is_rejected() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let row = t.db.callbacks().row();

    row.register("a", mark(&trail, "a"))?;
    let err = row.after("a").register("a", mark(&trail, "again")).unwrap_err();
    assert_eq!(err.to_string(), "conflicting callback a with after a");
    Ok(())
}

#[test]
fn unrelated_registration_after_conflict_goes_live() -> Result<()> {
    let t = common::bare_db();
    let trail = Trail::default();
    let raw = t.db.callbacks().raw();

    raw.before("b").register("a", mark(&trail, "a"))?;
    assert!(raw.before("a").register("b", mark(&trail, "b")).is_err());

    raw.register("unrelated", mark(&trail, "unrelated"))?;
    t.db.callbacks().compile_all()?;
    assert_eq!(raw.callback_names(), vec!["a", "unrelated"]);

    let mut stmt = t.db.statement(Operation::Raw);
    t.db.execute(&mut stmt);
    assert_eq!(*trail.lock(), vec!["a", "unrelated"]);
    Ok(())
}
