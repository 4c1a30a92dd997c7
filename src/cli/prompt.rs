use std::io::{self, BufRead, Write};

/// `yes` or `y`, any case.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Warns about the destructive restore and reads one answer line.
/// EOF counts as "no".
pub fn confirm_restore<R: BufRead>(input: &mut R) -> io::Result<bool> {
    println!("WARNING: This will DELETE ALL existing contacts and groups!");
    println!("It is recommended to create a backup first:");
    println!("  contacts-backup backup -o pre-restore-backup.json");
    println!();
    print!("Are you sure you want to continue? (yes/no): ");
    io::stdout().flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(is_affirmative(&answer))
}
