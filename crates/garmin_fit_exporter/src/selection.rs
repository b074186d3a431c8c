//! Interactive category selection.

use crate::{ExportError, ExportResult};
use garmin_connect_client::ActivitySummary;
use std::collections::BTreeSet;
use std::io::{BufRead, Write};

/// Categories chosen for export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategorySelection {
    /// Export every activity, including those without a category.
    All,
    Only(BTreeSet<String>),
}

impl CategorySelection {
    pub fn matches(&self, activity: &ActivitySummary) -> bool {
        match self {
            CategorySelection::All => true,
            CategorySelection::Only(wanted) => activity
                .category()
                .is_some_and(|category| wanted.contains(category)),
        }
    }
}

/// Sorted distinct categories present in the listing.
pub fn distinct_categories(activities: &[ActivitySummary]) -> Vec<String> {
    activities
        .iter()
        .filter_map(ActivitySummary::category)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn filter_activities<'a>(
    activities: &'a [ActivitySummary],
    selection: &CategorySelection,
) -> Vec<&'a ActivitySummary> {
    activities.iter().filter(|a| selection.matches(a)).collect()
}

/// Show the numbered category list and read a choice, reprompting on invalid
/// input. An empty answer, `all` or `*` selects everything.
pub fn prompt_category_selection<R, W>(
    categories: &[String],
    input: &mut R,
    output: &mut W,
) -> ExportResult<CategorySelection>
where
    R: BufRead,
    W: Write,
{
    if categories.is_empty() {
        writeln!(output, "No activity types detected; exporting every activity.")?;
        return Ok(CategorySelection::All);
    }

    writeln!(output, "\nAvailable activity types:")?;
    for (index, category) in categories.iter().enumerate() {
        writeln!(output, "  {:>2}: {}", index + 1, category)?;
    }

    loop {
        write!(
            output,
            "Enter comma-separated numbers to export, or 'all' to download every type [all]: "
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(ExportError::Input(
                "input closed before a selection was made".into(),
            ));
        }

        match parse_choice(line.trim(), categories) {
            Ok(selection) => return Ok(selection),
            Err(message) => writeln!(output, "{message}")?,
        }
    }
}

/// Parse one answer. The error is the message shown before reprompting.
fn parse_choice(choice: &str, categories: &[String]) -> Result<CategorySelection, String> {
    if choice.is_empty() || choice.eq_ignore_ascii_case("all") || choice == "*" {
        return Ok(CategorySelection::All);
    }

    let indexes = choice
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(|_| "Invalid entry. Please use comma-separated numbers or 'all'.".to_string())?;

    let out_of_range: Vec<String> = indexes
        .iter()
        .filter(|&&i| i < 1 || i > categories.len())
        .map(|i| i.to_string())
        .collect();
    if !out_of_range.is_empty() {
        return Err(format!("Indexes out of range: {}", out_of_range.join(", ")));
    }

    Ok(CategorySelection::Only(
        indexes
            .into_iter()
            .map(|i| categories[i - 1].clone())
            .collect(),
    ))
}
