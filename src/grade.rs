pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod report;

use log::{debug, info, warn};

use answer_grading::stats::Report;
use answer_grading::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::grade::config_reader::*;
use crate::grade::io_common::{simplify_file_name, Table};

#[derive(Debug, Snafu)]
pub enum GradeError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("File {path} is neither UTF-8 nor CP949 text"))]
    Encoding { path: String },
    #[snafu(display("File {path} has no data rows"))]
    EmptyFile { path: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Error reading CSV file {path}"))]
    CsvParse { source: csv::Error, path: String },
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV results to {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Invalid data in {path}: {source}"))]
    Grading {
        source: GradingErrors,
        path: String,
    },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type GradeResult<T> = Result<T, GradeError>;

/// Everything a run produced, before it is written anywhere.
#[derive(Debug, Clone)]
pub struct GradedExam {
    pub results: Vec<GradingResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub report: Report,
    pub summary: JSValue,
}

fn source_path(root: &Path, cfs: &FileSource) -> String {
    let p: PathBuf = root.join(&cfs.file_path);
    p.as_path().display().to_string()
}

fn read_table(root: &Path, cfs: &FileSource) -> GradeResult<(String, Table)> {
    let path = source_path(root, cfs);
    info!("Attempting to read {} file {:?}", cfs.provider, path);
    let table = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_table(&path, cfs)?,
        "xlsx" => io_excel::read_excel_table(&path, cfs)?,
        x => whatever!("Provider not implemented {:?}", x),
    };
    debug!(
        "read_table: {}: {} rows, {} columns",
        simplify_file_name(&path),
        table.rows.len(),
        table.columns
    );
    Ok((path, table))
}

fn has_data(table: &Table) -> bool {
    table
        .rows
        .iter()
        .any(|r| r.iter().any(|c| !c.trim().is_empty()))
}

fn load_key(root: &Path, cfs: &FileSource) -> GradeResult<(AnswerKey, Vec<Diagnostic>)> {
    let (path, table) = read_table(root, cfs)?;
    ensure!(has_data(&table), EmptyFileSnafu { path });
    let (key, diagnostics) =
        AnswerKey::from_table(&table.rows, table.columns).context(GradingSnafu { path: &path })?;
    info!(
        "Answer key {}: subjects {:?}",
        simplify_file_name(&path),
        key.subject_codes()
    );
    Ok((key, diagnostics))
}

fn load_roster(root: &Path, cfs: &FileSource) -> GradeResult<(Roster, Vec<Diagnostic>)> {
    let (path, table) = read_table(root, cfs)?;
    Roster::from_table(&table.rows, table.columns, table.row_offset)
        .context(GradingSnafu { path })
}

fn load_students(
    root: &Path,
    cfs: &FileSource,
    policy: TamguPolicy,
) -> GradeResult<(Vec<StudentAnswerRow>, Vec<Diagnostic>)> {
    let layout = cfs.student_layout()?;
    let (path, table) = read_table(root, cfs)?;
    ensure!(has_data(&table), EmptyFileSnafu { path });
    let (rows, diagnostics) = student_rows_from_table(layout, &table.rows, table.columns, policy)
        .context(GradingSnafu { path: &path })?;
    info!(
        "Student file {}: {:?} layout, {} rows",
        simplify_file_name(&path),
        layout,
        rows.len()
    );
    Ok((rows, diagnostics))
}

/// Grades all the student files of a configuration.
///
/// `root` is the directory that the file paths of the configuration are relative to.
pub fn grade_exam(
    config: &GradingConfig,
    root: &Path,
    subject: Option<&str>,
) -> GradeResult<GradedExam> {
    let rules = config.rules();
    let policy = rules.tamgu_policy()?;
    if config.student_file_sources.is_empty() {
        whatever!("No student file sources detected");
    }

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let (key, mut key_diagnostics) = load_key(root, &config.answer_key_source)?;
    diagnostics.append(&mut key_diagnostics);

    let mut ctx = GradingContext::new(key)
        .with_subject_names(config.subject_names.clone().unwrap_or_default());
    if let Some(cfs) = &config.roster_source {
        let (roster, mut roster_diagnostics) = load_roster(root, cfs)?;
        diagnostics.append(&mut roster_diagnostics);
        ctx = ctx.with_roster(roster);
    }

    let mut rows: Vec<StudentAnswerRow> = Vec::new();
    for cfs in config.student_file_sources.iter() {
        let (mut file_rows, mut file_diagnostics) = load_students(root, cfs, policy)?;
        rows.append(&mut file_rows);
        diagnostics.append(&mut file_diagnostics);
    }

    let mut run = grade_rows(&rows, &ctx);
    diagnostics.append(&mut run.diagnostics);
    for d in diagnostics.iter() {
        warn!("{}", d);
    }

    let report = Report::build(&run.results, subject, rules.top_wrong_questions());
    let summary =
        report::build_summary_js(config, subject, &run.results, &report, &diagnostics)?;
    Ok(GradedExam {
        results: run.results,
        diagnostics,
        report,
        summary,
    })
}

/// The configuration of a run: the configuration file if there is one, with the
/// command line flags on top of it.
///
/// Returns the configuration and the directory its paths are relative to.
pub fn resolve_config(args: &Args) -> GradeResult<(GradingConfig, PathBuf)> {
    let (mut config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => {
            let key = match &args.key {
                Some(k) => k,
                None => whatever!("Either --config or --key must be provided"),
            };
            let config = GradingConfig {
                output_settings: OutputSettings {
                    exam_name: args.exam_name.clone().unwrap_or_else(|| "exam".to_string()),
                    output_directory: None,
                    results_csv: None,
                    summary_json: None,
                },
                student_file_sources: Vec::new(),
                answer_key_source: FileSource::from_path(key, None),
                roster_source: None,
                subject_names: None,
                rules: None,
            };
            (config, PathBuf::new())
        }
    };

    // Paths given on the command line are relative to the working directory, not to
    // the configuration file.
    let cwd_relative = |path: &str| -> String {
        if root.as_os_str().is_empty() || Path::new(path).is_absolute() {
            path.to_string()
        } else {
            match std::env::current_dir() {
                Ok(d) => d.join(path).display().to_string(),
                Err(_) => path.to_string(),
            }
        }
    };

    if let Some(exam_name) = &args.exam_name {
        config.output_settings.exam_name = exam_name.clone();
    }
    if let Some(key) = &args.key {
        config.answer_key_source = FileSource::from_path(&cwd_relative(key), None);
    }
    if let Some(roster) = &args.roster {
        config.roster_source = Some(FileSource::from_path(&cwd_relative(roster), None));
    }
    if !args.students.is_empty() {
        config.student_file_sources = args
            .students
            .iter()
            .map(|s| FileSource::from_path(&cwd_relative(s), args.input_type.as_deref()))
            .collect();
    }
    for cfs in config.student_file_sources.iter_mut() {
        if let Some(layout) = &args.layout {
            cfs.layout = Some(layout.clone());
        }
        if let Some(input_type) = &args.input_type {
            cfs.provider = input_type.clone();
        }
        if let Some(name) = &args.excel_worksheet_name {
            cfs.excel_worksheet_name = Some(name.clone());
        }
    }
    debug!("resolve_config: {:?} root: {:?}", config, root);
    Ok((config, root))
}

fn output_path(root: &Path, settings: &OutputSettings, file_name: &str) -> String {
    let dir: PathBuf = match &settings.output_directory {
        Some(d) => root.join(d),
        None => root.to_path_buf(),
    };
    dir.join(file_name).display().to_string()
}

fn write_summary(pretty_summary: &str, path: &str) -> GradeResult<()> {
    if path == "stdout" {
        println!("{}", pretty_summary);
        return Ok(());
    }
    info!("Writing summary to {:?}", path);
    fs::write(path, pretty_summary).context(WritingOutputSnafu { path })
}

fn write_csv(results: &[GradingResult], path: &str) -> GradeResult<()> {
    info!("Writing results to {:?}", path);
    let f = fs::File::create(path).context(WritingOutputSnafu { path })?;
    report::write_results_csv(f, results).context(WritingCsvSnafu { path })
}

/// Compares a summary with a reference file, printing the differences.
pub fn check_reference(pretty_summary: &str, reference_path: &str) -> GradeResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_summary_ref != pretty_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_summary_ref.as_str(), pretty_summary, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("Summary matches the reference {:?}", reference_path);
    Ok(())
}

/// Runs a full grading from the command line arguments.
pub fn run_grading(args: &Args) -> GradeResult<()> {
    let (config, root) = resolve_config(args)?;
    info!("Grading exam {:?}", config.output_settings.exam_name);
    let exam = grade_exam(&config, &root, args.subject.as_deref())?;
    info!(
        "{} results, mean score {:?}, {} diagnostics",
        exam.report.summary.count,
        exam.report.summary.mean,
        exam.diagnostics.len()
    );

    let pretty_summary =
        serde_json::to_string_pretty(&exam.summary).context(SerializingJsonSnafu {})?;

    let summary_out = match (&args.out, &config.output_settings.summary_json) {
        (Some(out), _) => Some(out.clone()),
        (None, Some(f)) => Some(output_path(&root, &config.output_settings, f)),
        (None, None) => None,
    };
    match &summary_out {
        Some(path) => write_summary(&pretty_summary, path)?,
        // Nothing else would show the outcome.
        None if args.reference.is_none() => write_summary(&pretty_summary, "stdout")?,
        None => {}
    }

    let csv_out = match (&args.csv_out, &config.output_settings.results_csv) {
        (Some(out), _) => Some(out.clone()),
        (None, Some(f)) => Some(output_path(&root, &config.output_settings, f)),
        (None, None) => None,
    };
    if let Some(path) = csv_out {
        write_csv(&exam.results, &path)?;
    }

    if let Some(reference_path) = &args.reference {
        check_reference(&pretty_summary, reference_path)?;
    }
    Ok(())
}

/// Prints an error the way the command line reports it.
pub fn print_error(e: &GradeError) {
    eprintln!("An error occured: {}", e);
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        eprintln!("  caused by: {}", s);
        source = std::error::Error::source(s);
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}

#[cfg(test)]
fn test_dir() -> PathBuf {
    match option_env!("GRADE_TEST_DIR") {
        Some(d) => PathBuf::from(d),
        None => Path::new(env!("CARGO_MANIFEST_DIR")).join("tests"),
    }
}

#[cfg(test)]
fn run_grading_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> GradeResult<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    info!("Running test {}", test_name);
    let case_dir = test_dir().join(test_name);
    let config_path = case_dir.join(config_lpath).display().to_string();
    let config = read_config(&config_path)?;
    let exam = grade_exam(&config, &case_dir, None)?;
    let pretty_summary =
        serde_json::to_string_pretty(&exam.summary).context(SerializingJsonSnafu {})?;
    check_reference(
        &pretty_summary,
        &case_dir.join(summary_lpath).display().to_string(),
    )
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let res = run_grading_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = res {
        print_error(&e);
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
/// Runs a test case that must fail, and returns the error.
pub fn failing_test_wrapper(test_name: &str) -> GradeError {
    let _ = env_logger::builder().is_test(true).try_init();
    let case_dir = test_dir().join(test_name);
    let config_path = case_dir
        .join(format!("{}_config.json", test_name))
        .display()
        .to_string();
    let res = read_config(&config_path).and_then(|config| grade_exam(&config, &case_dir, None));
    match res {
        Ok(_) => panic!("test {} should have failed", test_name),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_with_roster() {
        test_wrapper("standard_with_roster");
    }

    #[test]
    fn tamgu_skip_incomplete() {
        test_wrapper("tamgu_skip_incomplete");
    }

    #[test]
    fn cp949_key() {
        test_wrapper("cp949_key");
    }

    #[test]
    fn xlsx_students() {
        test_wrapper("xlsx_students");
    }

    #[test]
    fn tamgu_abort_incomplete() {
        let e = failing_test_wrapper("tamgu_abort_incomplete");
        assert!(matches!(
            e,
            GradeError::Grading {
                source: GradingErrors::IncompleteAnswerBlock { missing: 2, .. },
                ..
            }
        ));
    }

    #[test]
    fn header_only_student_file() {
        let e = failing_test_wrapper("header_only_students");
        assert!(matches!(e, GradeError::EmptyFile { .. }));
    }

    #[test]
    fn missing_student_file() {
        let e = failing_test_wrapper("missing_student_file");
        assert!(matches!(e, GradeError::OpeningFile { .. }));
    }

    #[test]
    fn reference_mismatch_fails() {
        let e = check_reference("{}", "/nonexistent/reference.json").unwrap_err();
        assert!(matches!(e, GradeError::OpeningJson { .. }));
        let case_dir = test_dir().join("standard_with_roster");
        let reference = case_dir
            .join("standard_with_roster_expected_summary.json")
            .display()
            .to_string();
        let e = check_reference("{}", &reference).unwrap_err();
        assert!(matches!(e, GradeError::ReferenceMismatch { .. }));
    }

    #[test]
    fn flags_override_config() {
        let case_dir = test_dir().join("standard_with_roster");
        let args = Args {
            config: Some(
                case_dir
                    .join("standard_with_roster_config.json")
                    .display()
                    .to_string(),
            ),
            exam_name: Some("Final".to_string()),
            layout: Some("tamgu".to_string()),
            ..Args::default()
        };
        let (config, root) = resolve_config(&args).unwrap();
        assert_eq!(root, case_dir);
        assert_eq!(config.output_settings.exam_name, "Final");
        assert_eq!(
            config.student_file_sources[0].student_layout().unwrap(),
            StudentLayout::Tamgu
        );
        assert!(config.roster_source.is_some());
    }

    #[test]
    fn flags_without_config() {
        let args = Args {
            key: Some("key.csv".to_string()),
            students: vec!["a.xlsx".to_string(), "b.csv".to_string()],
            ..Args::default()
        };
        let (config, root) = resolve_config(&args).unwrap();
        assert_eq!(root, PathBuf::new());
        assert_eq!(config.output_settings.exam_name, "exam");
        assert_eq!(config.answer_key_source.file_path, "key.csv");
        let providers: Vec<&str> = config
            .student_file_sources
            .iter()
            .map(|s| s.provider.as_str())
            .collect();
        assert_eq!(providers, vec!["xlsx", "csv"]);
        assert!(resolve_config(&Args::default()).is_err());
    }
}
