//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `lazytodo_core` linkage without the Flutter/FFI runtime.
//! - Walk one add/defer/resolve session against an in-memory outbox.

use chrono::{Duration, Utc};
use lazytodo_core::action::{self, DeferRequest, NewTask};
use lazytodo_core::db::open_db_in_memory;
use lazytodo_core::{Dispatch, SqliteNotificationScheduler, TaskState, TaskStore, TaskType};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lazytodo_core ping={}", lazytodo_core::ping());
    println!("lazytodo_core version={}", lazytodo_core::core_version());

    match run_session() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("session failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_session() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let outbox = SqliteNotificationScheduler::try_new(&conn)?;
    let mut store = TaskStore::new(TaskState::initial(Utc::now()));
    store.subscribe(|state| {
        println!(
            "state tasks={} filter={}",
            state.tasks.len(),
            state.filter_type
        );
    });

    let id = action::add_task(&mut store, NewTask::new("Smoke test task", Utc::now()));
    store.dispatch(action::set_deferring_task(id));
    let until = Utc::now() + Duration::minutes(1);
    action::defer_task(
        &mut store,
        &outbox,
        DeferRequest {
            id,
            until: Some(until),
            animated: false,
        },
    );
    store.dispatch(action::change_task_type(id, TaskType::Deferred));
    action::change_filter_type_with_cleanup(&mut store, TaskType::Deferred);

    for task in store.visible_tasks() {
        println!(
            "deferred id={} until={}",
            task.id,
            task.deferred_until()
                .map_or_else(|| "-".to_string(), |at| at.to_rfc3339())
        );
    }
    println!("outbox pending={}", outbox.pending()?.len());
    Ok(())
}
