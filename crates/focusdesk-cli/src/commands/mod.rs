pub mod config;
pub mod session;
pub mod task;
pub mod timer;

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
