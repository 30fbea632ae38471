use std::{
    error::Error,
    io::{self},
    str::FromStr,
    sync::{Arc, Mutex},
};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;

use ledgerly::{
    db,
    models::{NewUser, PasswordHash, ValidatedPassword},
    stores::{SQLiteUserStore, UserStore},
};

/// A utility for creating an admin account.
///
/// The registration route only creates regular users, so the first admin has
/// to be created from the command line on the server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The username of the new admin.
    #[arg(long)]
    username: String,

    /// The email address of the new admin.
    #[arg(long)]
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let email = match EmailAddress::from_str(&args.email) {
        Ok(email) => email,
        Err(error) => {
            print_error(format!("\"{}\" is not a valid email address: {error}", args.email));
            return Ok(());
        }
    };

    let password_hash = match get_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };

    let connection = Connection::open(&args.db_path)?;
    db::initialize(&connection)?;
    let user_store = SQLiteUserStore::new(Arc::new(Mutex::new(connection)));

    let user = user_store.create(NewUser {
        username: args.username,
        email,
        password_hash,
        is_admin: true,
    })?;

    println!("Created admin {} with ID {}.", user.username, user.id);

    Ok(())
}

fn get_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if let Err(error) = ValidatedPassword::new(&first_password) {
            print_error(error);
            continue;
        }

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        let password_hash =
            match PasswordHash::from_raw_password(&first_password, PasswordHash::DEFAULT_COST) {
                Ok(password_hash) => password_hash,
                Err(error) => {
                    print_error(format!("Could not hash password: {error}. Try again."));
                    continue;
                }
            };

        return Some(password_hash);
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
