//! `sd` - soft delete, undelete and hard delete rows of a SQLite database.

use softdel::run;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
