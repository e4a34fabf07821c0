use crate::types::Violation;
use std::collections::BTreeSet;

pub fn system_directive(language: &str) -> String {
    format!(
        "You are an experienced {language} developer focused on clean code. \
        You make concise, efficient fixes as you would in a pull request: \
        the smallest change that resolves the issue, written the way idiomatic {language} is written. \
        Reply with the complete source file only. No explanations, no notes."
    )
}

/// Build the task directive for one rule group.
///
/// `representative` supplies the description and documentation link for the whole group.
pub fn task_directive(
    language: &str,
    rule: &str,
    representative: &Violation,
    impacted_lines: &BTreeSet<u32>,
    source: &str,
) -> String {
    let docs = match &representative.url {
        Some(url) => format!("The documentation is {}.\n", url),
        None => String::new(),
    };

    format!(
        "Your task is to fix the code so that it conforms to the rule \"{rule}\" in the {language} file below.\n\
        The recommendation to fix the issue is: {description}\n\
        {docs}\n\
        The output must be the complete {language} source file with the minimum of modifications \
        needed to fix the issue, keeping the rest of the file untouched.\n\
        No additional explanations or notes unless you write them as {language} comments. \
        Do not include the <file> tags in the output.\n\n\
        Impacted lines: {lines}\n\n\
        <file>\n{source}\n</file>\n",
        description = representative.description.trim(),
        lines = format_lines(impacted_lines),
    )
}

fn format_lines(lines: &BTreeSet<u32>) -> String {
    lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::violation;

    #[test]
    fn test_task_directive_contents() {
        let mut v = violation("UnusedImports", 3, 3);
        v.description = "Avoid unused imports such as 'java.util.List'".into();
        v.url = Some("https://docs.pmd-code.org/unusedimports".into());
        let lines = BTreeSet::from([3, 10, 11]);

        let task = task_directive("Java", "UnusedImports", &v, &lines, "class A {}\n");
        assert!(task.contains("\"UnusedImports\""));
        assert!(task.contains("Avoid unused imports such as 'java.util.List'"));
        assert!(task.contains("The documentation is https://docs.pmd-code.org/unusedimports."));
        assert!(task.contains("Impacted lines: 3, 10, 11"));
        assert!(task.ends_with("<file>\nclass A {}\n\n</file>\n"));
    }

    #[test]
    fn test_task_directive_without_url() {
        let v = violation("EmptyCatchBlock", 4, 6);
        let task = task_directive("Java", "EmptyCatchBlock", &v, &BTreeSet::from([4, 5, 6]), "x");
        assert!(!task.contains("documentation"));
    }

    #[test]
    fn test_system_directive_mentions_language() {
        assert!(system_directive("Kotlin").contains("Kotlin developer"));
    }
}
