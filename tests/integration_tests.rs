use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Helper function to run skimlit with arguments and optional stdin content
fn run_skimlit(args: &[&str], stdin_content: Option<&str>) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_skimlit"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Some(content) = stdin_content {
            stdin
                .write_all(content.as_bytes())
                .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn is_zip(bytes: &[u8]) -> bool {
    bytes.len() > 4 && &bytes[0..4] == b"PK\x03\x04"
}

fn sorted_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_end_to_end_sales_report() {
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tmp.path().join("charts");
    let export = tmp.path().join("cleaned.xlsx");

    let result = run_skimlit(
        &[
            "test/sales.csv",
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--export",
            export.to_str().unwrap(),
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    assert_eq!(
        sorted_file_names(&out_dir),
        vec![
            "01_region_pie_chart.png",
            "02_units_histogram.png",
            "03_units_box_plot.png",
            "04_price_histogram.png",
            "05_price_box_plot.png",
            "06_channel_pie_chart.png",
            "07_rep_bar_chart.png",
            "08_correlation_heatmap.png",
        ]
    );
    for name in sorted_file_names(&out_dir) {
        let bytes = fs::read(out_dir.join(&name)).unwrap();
        assert!(is_valid_png(&bytes), "{} is not a valid PNG", name);
    }

    assert!(is_zip(&fs::read(&export).unwrap()));
}

#[test]
fn test_end_to_end_stdin_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let csv = fs::read_to_string("test/scenario.csv").expect("Failed to read test CSV");
    let out_dir = tmp.path().join("charts");
    let export = tmp.path().join("data.xlsx");

    let stdout = run_skimlit(
        &[
            "-",
            "--summary",
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--export",
            export.to_str().unwrap(),
        ],
        Some(&csv),
    )
    .expect("run failed");

    let summary: serde_json::Value = serde_json::from_slice(&stdout).expect("summary is not JSON");
    assert_eq!(summary["rows"], 3);
    assert_eq!(summary["imputed"][0]["column"], "a");
    assert_eq!(summary["imputed"][0]["stat"]["mean"], 2.0);

    let kinds: Vec<&str> = summary["charts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["histogram", "box_plot", "pie_chart"]);
    assert_eq!(summary["diagnostics"].as_array().unwrap().len(), 0);
}

#[test]
fn test_end_to_end_single_numeric_has_no_heatmap() {
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tmp.path().join("charts");
    let export = tmp.path().join("data.xlsx");

    let result = run_skimlit(
        &[
            "test/single_numeric.csv",
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--export",
            export.to_str().unwrap(),
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    let names = sorted_file_names(&out_dir);
    assert!(names.iter().all(|n| !n.contains("heatmap")));
    // name pie chart, score histogram and box plot
    assert_eq!(names.len(), 3);
}

#[test]
fn test_end_to_end_svg_output() {
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tmp.path().join("charts");
    let export = tmp.path().join("data.xlsx");
    let options = tmp.path().join("options.json");
    fs::write(&options, r#"{"width": 640, "height": 480, "type": "svg"}"#).unwrap();

    let result = run_skimlit(
        &[
            "test/scenario.csv",
            "--options",
            options.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--export",
            export.to_str().unwrap(),
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    let names = sorted_file_names(&out_dir);
    assert_eq!(
        names,
        vec!["01_a_histogram.svg", "02_a_box_plot.svg", "03_b_pie_chart.svg"]
    );
    let svg = fs::read_to_string(out_dir.join("03_b_pie_chart.svg")).unwrap();
    assert!(svg.contains("66.7%"));
}

#[test]
fn test_end_to_end_invalid_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let export = tmp.path().join("data.xlsx");
    let result = run_skimlit(
        &["--export", export.to_str().unwrap()],
        Some("a,b\n1,2\n1,2,3\n"),
    );
    assert!(result.is_err(), "Should have failed with parse error");
    assert!(result.unwrap_err().contains("Parse error"));
    assert!(!export.exists());
}

#[test]
fn test_end_to_end_empty_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let export = tmp.path().join("data.xlsx");
    let result = run_skimlit(&["--export", export.to_str().unwrap()], Some("x,y\n"));
    assert!(result.is_err(), "Should have failed with empty CSV error");
    assert!(result.unwrap_err().contains("no data rows"));
}

#[test]
fn test_end_to_end_missing_file() {
    let result = run_skimlit(&["test/does_not_exist.csv"], None);
    assert!(result.is_err());
}
