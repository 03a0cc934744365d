//! Line-oriented stdin prompts. Labels go to stderr so stdout stays clean
//! for row data.

use std::io::{BufRead, Write};

fn read_line_from(
    input: &mut impl BufRead,
    label: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    eprint!("{}: ", label);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    // A zero-byte read means stdin is closed (Ctrl-D, or a non-interactive
    // run); looping on it would spin forever, so it is an error.
    if input.read_line(&mut answer)? == 0 {
        return Err("Stdin closed before a value was entered".into());
    }
    Ok(answer.trim().to_string())
}

fn read_nonempty_from(
    input: &mut impl BufRead,
    label: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    loop {
        let answer = read_line_from(input, label)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        eprintln!("A value is required.");
    }
}

/// Prompt for one line of input; the result is trimmed
pub fn prompt_line(label: &str) -> Result<String, Box<dyn std::error::Error>> {
    read_line_from(&mut std::io::stdin().lock(), label)
}

/// Prompt until a non-empty value is entered
pub fn prompt_nonempty(label: &str) -> Result<String, Box<dyn std::error::Error>> {
    read_nonempty_from(&mut std::io::stdin().lock(), label)
}

/// Prompt with a default shown in brackets; empty input keeps the default
pub fn prompt_with_default(
    label: &str,
    default: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let answer = prompt_line(&format!("{} [{}]", label, default))?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}

/// Yes/no question, defaulting to no
pub fn ask_yes_no(question: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let answer = prompt_line(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.as_str(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_and_trims_a_line() {
        let mut input = Cursor::new("  hello \n");
        assert_eq!(read_line_from(&mut input, "Value").unwrap(), "hello");
    }

    #[test]
    fn closed_stdin_is_an_error_not_a_spin() {
        let mut input = Cursor::new("");
        let err = read_line_from(&mut input, "Value").unwrap_err();
        assert!(err.to_string().contains("Stdin closed"));
    }

    #[test]
    fn nonempty_skips_blank_lines_then_accepts() {
        let mut input = Cursor::new("\n   \nvalue\n");
        assert_eq!(read_nonempty_from(&mut input, "Value").unwrap(), "value");
    }

    #[test]
    fn nonempty_errors_when_stdin_closes_before_a_value() {
        // Blank lines followed by EOF must terminate with an error instead
        // of re-prompting forever.
        let mut input = Cursor::new("\n\n");
        let err = read_nonempty_from(&mut input, "Value").unwrap_err();
        assert!(err.to_string().contains("Stdin closed"));
    }
}
