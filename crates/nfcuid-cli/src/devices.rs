//! Reader listing and selection.

use crate::error::CliError;
use dialoguer::Input;
use nfcuid_core::{DeviceSelection, Error};
use nfcuid_service::reader_at;

/// Print the numbered reader list and resolve the selection to a reader name.
///
/// # Errors
///
/// Returns `Error::NoDevices` for an empty list, `Error::DeviceOutOfRange`
/// for a `--device` past the end, and `CliError::Prompt` if the terminal
/// prompt fails.
pub fn select_reader(readers: &[String], selection: DeviceSelection) -> Result<String, CliError> {
    if readers.is_empty() {
        return Err(Error::NoDevices.into());
    }

    println!("Found {} device(s):", readers.len());
    for (i, reader) in readers.iter().enumerate() {
        println!("[{}] {}", i + 1, reader);
    }

    let device = match selection {
        DeviceSelection::Index(device) => device,
        DeviceSelection::Prompt => prompt_device(readers.len())?,
    };

    let reader = reader_at(readers, device)?;
    println!("Selected device:");
    println!("[{device}] {reader}");
    Ok(reader.to_string())
}

fn prompt_device(count: usize) -> Result<usize, CliError> {
    let input: String = Input::new()
        .with_prompt("Enter device number to start")
        .validate_with(move |input: &String| parse_device(input, count).map(|_| ()))
        .interact_text()
        .map_err(|e| CliError::Prompt(e.to_string()))?;

    parse_device(&input, count).map_err(CliError::Prompt)
}

/// Check one line of prompt input against `1..=count`.
fn parse_device(input: &str, count: usize) -> Result<usize, String> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| "Please input integer value".to_string())?;

    if value <= 0 {
        return Err("Please input positive integer value".to_string());
    }

    match usize::try_from(value) {
        Ok(device) if device <= count => Ok(device),
        _ => Err(format!("Value should be less than or equal to {count}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", Ok(1))]
    #[case(" 3 ", Ok(3))]
    #[case("abc", Err("Please input integer value".to_string()))]
    #[case("0", Err("Please input positive integer value".to_string()))]
    #[case("-2", Err("Please input positive integer value".to_string()))]
    #[case("4", Err("Value should be less than or equal to 3".to_string()))]
    fn test_parse_device(#[case] input: &str, #[case] expected: Result<usize, String>) {
        assert_eq!(parse_device(input, 3), expected);
    }

    #[test]
    fn test_select_by_index() {
        let readers = vec!["Reader A".to_string(), "Reader B".to_string()];
        assert_eq!(
            select_reader(&readers, DeviceSelection::Index(2)).unwrap(),
            "Reader B"
        );
    }

    #[test]
    fn test_select_out_of_range() {
        let readers = vec!["Reader A".to_string()];
        assert!(matches!(
            select_reader(&readers, DeviceSelection::Index(2)),
            Err(CliError::Config(Error::DeviceOutOfRange {
                requested: 2,
                available: 1
            }))
        ));
    }

    #[test]
    fn test_select_without_readers() {
        assert!(matches!(
            select_reader(&[], DeviceSelection::Prompt),
            Err(CliError::Config(Error::NoDevices))
        ));
    }
}
