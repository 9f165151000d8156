use chatmark::markdown_to_html;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct RenderCase {
    name: String,
    section: String,
    markdown: String,
    html: String,
}

#[test]
fn rendered_cases_match() {
    let data = fs::read_to_string("tests/data/cases.json").expect("Failed to read cases.json");
    let cases: Vec<RenderCase> = serde_json::from_str(&data).expect("Failed to parse cases.json");

    let mut failures = Vec::new();
    for case in &cases {
        let result = markdown_to_html(&case.markdown);
        if result != case.html {
            eprintln!("\nCase {} failed ({})", case.name, case.section);
            eprintln!("  Input:    {:?}", case.markdown);
            eprintln!("  Expected: {:?}", case.html);
            eprintln!("  Got:      {:?}", result);
            failures.push(case.name.as_str());
        }
    }

    assert!(
        failures.is_empty(),
        "{} of {} cases failed: {:?}",
        failures.len(),
        cases.len(),
        failures
    );
}
