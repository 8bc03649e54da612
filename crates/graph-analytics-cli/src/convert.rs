use std::io::{BufRead, Write};

use anyhow::Context;
use graph_analytics::{AnalyticsRecord, Extractor};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) converted: usize,
    /// Records without the GraphQL tag.
    pub(crate) skipped: usize,
    pub(crate) failed: usize,
}

/// Converts newline-delimited JSON analytics records, writing one graph record per line.
///
/// Blank lines are ignored. A line that is not a record or a record that fails to convert
/// is logged and counted, or aborts the conversion with `fail_fast`.
pub(crate) fn convert(
    extractor: &Extractor,
    input: impl BufRead,
    mut output: impl Write,
    fail_fast: bool,
) -> anyhow::Result<Summary> {
    let mut summary = Summary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.context("reading the input")?;
        let line_number = index + 1;

        if line.trim().is_empty() {
            continue;
        }

        let record: AnalyticsRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(error) if fail_fast => {
                return Err(error).with_context(|| format!("line {line_number} is not an analytics record"));
            }
            Err(error) => {
                tracing::warn!(line = line_number, "skipping a line that is not an analytics record: {error}");
                summary.failed += 1;
                continue;
            }
        };

        if !extractor.is_graph_record(&record) {
            tracing::debug!(line = line_number, api_id = %record.api_id, "skipping a record without the graph tag");
            summary.skipped += 1;
            continue;
        }

        match extractor.to_graph_record(&record) {
            Ok(graph_record) => {
                serde_json::to_writer(&mut output, &graph_record).context("writing a graph record")?;
                output.write_all(b"\n")?;
                summary.converted += 1;
            }
            Err(error) if fail_fast => {
                return Err(error).with_context(|| format!("converting the record on line {line_number}"));
            }
            Err(error) => {
                tracing::warn!(line = line_number, api_id = %record.api_id, "skipping a record: {error}");
                summary.failed += 1;
            }
        }
    }

    output.flush()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use graph_analytics::{ExtractorConfig, GraphRecord, GRAPH_ANALYTICS_TAG};
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    fn http_message(start_line: &str, body: &str) -> String {
        let message = format!("{start_line}\r\nContent-Length: {}\r\n\r\n{body}", body.len());

        STANDARD.encode(message)
    }

    fn record_line(tags: &[&str], query: &str) -> String {
        json!({
            "api_id": "test-api",
            "timestamp": "2022-01-01T00:00:00Z",
            "tags": tags,
            "raw_request": http_message("POST / HTTP/1.1", &json!({ "query": query }).to_string()),
            "raw_response": http_message("HTTP/1.1 200 OK", r#"{"data":{}}"#),
            "api_schema": STANDARD.encode(indoc! {r#"
                type Query { hero: Character }
                type Character { name: String }
            "#}),
        })
        .to_string()
    }

    fn run(input: &str, fail_fast: bool) -> (anyhow::Result<Summary>, Vec<GraphRecord>) {
        let mut output = Vec::new();
        let result = convert(&Extractor::default(), input.as_bytes(), &mut output, fail_fast);

        let records = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        (result, records)
    }

    #[test]
    fn mixed_input() {
        let input = [
            record_line(&[GRAPH_ANALYTICS_TAG], "{ hero { name } }"),
            String::new(),
            record_line(&["rest"], "{ hero { name } }"),
            "not json".to_owned(),
            record_line(&[GRAPH_ANALYTICS_TAG], "type Query { hero: Character }"),
            record_line(&["rest", GRAPH_ANALYTICS_TAG], "query Hero { hero { __typename } }"),
        ]
        .join("\n");

        let (summary, records) = run(&input, false);

        assert_eq!(
            summary.unwrap(),
            Summary {
                converted: 2,
                skipped: 1,
                failed: 2,
            }
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].types["Character"], ["name"]);
        assert_eq!(records[1].types["Character"], ["__typename"]);
        assert_eq!(records[1].root_fields, ["hero"]);
    }

    #[test]
    fn fail_fast_stops_at_the_first_failure() {
        let input = [
            record_line(&[GRAPH_ANALYTICS_TAG], "{ hero { name } }"),
            record_line(&[GRAPH_ANALYTICS_TAG], "type Query { hero: Character }"),
            record_line(&[GRAPH_ANALYTICS_TAG], "{ hero { name } }"),
        ]
        .join("\n");

        let (result, records) = run(&input, true);

        let error = format!("{:#}", result.unwrap_err());
        assert!(error.starts_with("converting the record on line 2"), "{error}");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn fail_fast_on_invalid_lines() {
        let (result, records) = run("{\"tags\": 42}", true);

        let error = format!("{:#}", result.unwrap_err());
        assert!(error.starts_with("line 1 is not an analytics record"), "{error}");
        assert!(records.is_empty());
    }

    #[test]
    fn configured_tag() {
        let extractor = Extractor::new(ExtractorConfig {
            graph_tag: "graphql".into(),
            ..Default::default()
        });

        let input = [
            record_line(&[GRAPH_ANALYTICS_TAG], "{ hero { name } }"),
            record_line(&["graphql"], "{ hero { name } }"),
        ]
        .join("\n");

        let mut output = Vec::new();
        let summary = convert(&extractor, input.as_bytes(), &mut output, false).unwrap();

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn empty_input() {
        let (summary, records) = run("", false);

        assert_eq!(summary.unwrap(), Summary::default());
        assert!(records.is_empty());
    }
}
