//! Subcommand bodies, kept free of process setup so they run against any
//! connection and writer.

use crate::cli::{AddUserArgs, UserCommand};
use log::info;
use notekeeper_core::{Clock, SqliteUserRepository, SystemClock, User, UserRepository};
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;

pub fn run_user_command<W: Write>(
    conn: &Connection,
    command: UserCommand,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let users = SqliteUserRepository::try_new(conn)?;
    match command {
        UserCommand::Add(args) => add_user(&users, args, out),
        UserCommand::List => {
            for user in users.list_users()? {
                writeln!(out, "{}", serde_json::to_string(&user)?)?;
            }
            Ok(())
        }
        UserCommand::Remove { id } => {
            users.delete_user(id)?;
            info!("event=user_remove module=cli status=ok user_id={id}");
            writeln!(out, "removed {id}")?;
            Ok(())
        }
    }
}

fn add_user<W: Write>(
    users: &SqliteUserRepository<'_>,
    args: AddUserArgs,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    if users.find_user_by_email(&args.email)?.is_some() {
        return Err(format!("a user with email `{}` already exists", args.email).into());
    }
    let user = User::new(args.name, args.email, args.role, SystemClock.now_epoch_ms());
    let id = users.create_user(&user)?;
    info!(
        "event=user_add module=cli status=ok user_id={id} role={}",
        user.role
    );
    writeln!(out, "{}", serde_json::to_string(&user)?)?;
    Ok(())
}
