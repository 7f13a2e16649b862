use crate::types::report::ScoreReport;

pub fn to_markdown(report: &ScoreReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "# Contribution Report: {} ({})\n\n",
        report.team.name, report.team.code
    ));
    output.push_str(&format!(
        "Students: {} | generated {}\n\n",
        report.students_count, report.generated_at
    ));

    output.push_str("## Ranking\n\n");
    if report.ranking.is_empty() {
        output.push_str("- none\n\n");
    } else {
        output.push_str("| rank | name | email | score |\n|---|---|---|---|\n");
        for entry in &report.ranking {
            output.push_str(&format!(
                "| {} | {} | {} | {:.2} |\n",
                entry.rank,
                entry.name,
                entry.email.as_deref().unwrap_or("-"),
                entry.score
            ));
        }
        output.push('\n');
    }

    output.push_str("## Weights\n\n");
    for dim in &report.dims {
        let weight = report.weights.get(dim).copied().unwrap_or(0.0);
        output.push_str(&format!("- {dim}: {weight}\n"));
    }
    output.push('\n');

    output.push_str("## Breakdown\n\n");
    for entry in &report.ranking {
        output.push_str(&format!("### {}\n\n", entry.name));
        for dim in &report.dims {
            output.push_str(&format!(
                "- {}: {:.4} (raw {})\n",
                dim,
                entry.breakdown.get(dim).copied().unwrap_or(0.0),
                entry.raw.get(dim).copied().unwrap_or(0.0)
            ));
        }
        if let Some(attendance) = entry.raw.get("attendance") {
            output.push_str(&format!("- attendance: {:.0}%\n", attendance * 100.0));
        }
        output.push('\n');
    }

    output.push_str("## Unmatched Identities\n\n");
    if report.unmatched.is_empty() {
        output.push_str("- none\n");
    } else {
        for unmatched in &report.unmatched {
            output.push_str(&format!(
                "- [{}] {}\n",
                unmatched.source.as_str(),
                unmatched.key
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::sample_report;

    #[test]
    fn markdown_report_contains_sections() {
        let rendered = to_markdown(&sample_report());
        assert!(rendered.contains("# Contribution Report: Falcons (COS40005)"));
        assert!(rendered.contains("## Ranking"));
        assert!(rendered.contains("| 1 | Alice | alice@x.edu | 100.00 |"));
        assert!(rendered.contains("- commits: 7"));
        assert!(rendered.contains("- attendance: 90%"));
        assert!(rendered.contains("- [code] Carol Smith"));
    }
}
