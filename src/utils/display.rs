use crate::core::JsonRpcResponse;
use crate::tools::RestEndpoint;
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

/// One line per tool: verb, name, path and a marker for guarded endpoints
pub fn print_endpoint(endpoint: &RestEndpoint) {
    let verb = format!("{:<6}", endpoint.verb().as_str());
    let guard = if endpoint.is_guarded() {
        " [guarded]".yellow().to_string()
    } else {
        String::new()
    };

    println!(
        "  {} {} {}{}",
        verb.magenta().bold(),
        endpoint.name().bright_white().bold(),
        endpoint.path().dimmed(),
        guard
    );
    println!("         {}", endpoint.description());
}

pub fn print_response(response: &JsonRpcResponse) {
    let rendered = serde_json::to_string_pretty(response).unwrap_or_else(|e| e.to_string());

    match response.error_object() {
        Some(error) => {
            print_error(&format!("Error {}: {}", error.code, error.message));
            println!("{}", rendered);
        }
        None if response.result().is_some_and(|r| r["isError"] == true) => {
            println!("{}", rendered.yellow());
        }
        None => println!("{}", rendered.green()),
    }
}
