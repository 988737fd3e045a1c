use crate::grade::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "examName")]
    pub exam_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "resultsCsv")]
    pub results_csv: Option<String>,
    #[serde(rename = "summaryJson")]
    pub summary_json: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub exam: String,
    pub subject: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub layout: Option<String>,
    #[serde(rename = "hasHeader")]
    pub has_header: Option<bool>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    /// A source for a path given on the command line. The provider follows the extension
    /// unless it is given explicitly.
    pub fn from_path(path: &str, provider: Option<&str>) -> FileSource {
        let provider = provider.map(|s| s.to_string()).unwrap_or_else(|| {
            if path.to_lowercase().ends_with(".xlsx") {
                "xlsx".to_string()
            } else {
                "csv".to_string()
            }
        });
        FileSource {
            provider,
            file_path: path.to_string(),
            layout: None,
            has_header: None,
            excel_worksheet_name: None,
        }
    }

    pub fn has_header(&self) -> bool {
        self.has_header.unwrap_or(true)
    }

    pub fn student_layout(&self) -> GradeResult<StudentLayout> {
        match self.layout.as_deref() {
            None | Some("standard") => Ok(StudentLayout::Standard),
            Some("tamgu") => Ok(StudentLayout::Tamgu),
            Some(x) => whatever!("unknown student file layout: {}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradingRules {
    #[serde(rename = "incompleteTamguPolicy")]
    pub incomplete_tamgu_policy: Option<String>,
    #[serde(rename = "topWrongQuestions")]
    pub top_wrong_questions: Option<usize>,
}

impl GradingRules {
    pub const DEFAULT_TOP_WRONG_QUESTIONS: usize = 10;

    pub fn tamgu_policy(&self) -> GradeResult<TamguPolicy> {
        match self.incomplete_tamgu_policy.as_deref() {
            None | Some("abort") => Ok(TamguPolicy::Abort),
            Some("skip") => Ok(TamguPolicy::Skip),
            Some(x) => whatever!("unknown incompleteTamguPolicy: {}", x),
        }
    }

    pub fn top_wrong_questions(&self) -> usize {
        self.top_wrong_questions
            .unwrap_or(GradingRules::DEFAULT_TOP_WRONG_QUESTIONS)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "studentFileSources")]
    pub student_file_sources: Vec<FileSource>,
    #[serde(rename = "answerKeySource")]
    pub answer_key_source: FileSource,
    #[serde(rename = "rosterSource")]
    pub roster_source: Option<FileSource>,
    #[serde(rename = "subjectNames")]
    pub subject_names: Option<HashMap<String, String>>,
    pub rules: Option<GradingRules>,
}

impl GradingConfig {
    pub fn rules(&self) -> GradingRules {
        self.rules.clone().unwrap_or_default()
    }
}

pub fn read_config(path: &str) -> GradeResult<GradingConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: GradingConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Reads a reference summary, normalized the same way as the computed one.
pub fn read_summary(path: &str) -> GradeResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
