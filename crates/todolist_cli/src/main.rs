//! CLI smoke entry point.
//!
//! Runs one unit of work end to end against a database file (first
//! argument) or a private in-memory database, and prints what it did.
//! File logging starts when `TODOLIST_LOG_DIR` names an absolute directory.

use std::process::ExitCode;
use std::sync::Arc;
use todolist_data::{
    Category, DbUnitOfWork, Repository, ThingToDo, ToDoListDbContext, UnitOfWork, User,
};

fn main() -> ExitCode {
    println!("todolist_data version={}", todolist_data::core_version());

    if let Ok(log_dir) = std::env::var("TODOLIST_LOG_DIR") {
        let level = todolist_data::default_log_level();
        if let Err(err) = todolist_data::init_logging(level, &log_dir) {
            eprintln!("todolist_data logging status=error error={err}");
        }
    }

    match run(std::env::args().nth(1)) {
        Ok(saved) => {
            println!("todolist_data smoke status=ok rows_saved={saved}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("todolist_data smoke status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: Option<String>) -> Result<usize, Box<dyn std::error::Error>> {
    let context = match db_path {
        Some(path) => ToDoListDbContext::open(path)?,
        None => ToDoListDbContext::open_in_memory()?,
    };
    let uow = DbUnitOfWork::new(Arc::new(context));

    uow.begin_transaction()?;
    let owner = User::new(format!("smoke-{}", std::process::id()), "smoke@example.com");
    let category = Category::new(owner.id, "Inbox");
    let thing = ThingToDo::new(category.id, owner.id, "Try the unit of work");

    uow.users().add(&owner)?;
    uow.categories().add(&category)?;
    uow.things_to_do().add(&thing)?;
    let saved = uow.save_changes()?;
    uow.commit_transaction()?;

    Ok(saved)
}
