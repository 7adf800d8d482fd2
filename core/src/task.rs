use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::testing::{CaseDescription, Lang};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Unknown task language '{0}'")]
    UnknownLang(String),

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// One input or expected-output file of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoFile {
    pub name: String,
    pub path: PathBuf,
    pub custom: bool,

    /// Overrides the task's time limit for this case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
}

impl IoFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, custom: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            custom,
            time_limit_ms: None,
        }
    }

    /// `test-7` => `Some(7)`
    pub fn id(&self) -> Option<usize> {
        self.name.strip_prefix("test-")?.parse().ok()
    }
}

/// Metadata of a task directory, persisted as JSON.
///
/// Relative paths are relative to the task directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMeta {
    pub task_name: String,
    pub task_lang: String,
    pub inputs: Vec<IoFile>,
    pub outputs: Vec<IoFile>,
    pub task_file: PathBuf,
    pub time_limit_ms: u64,

    /// Generator source; `None` means the task has no batch.
    #[serde(default)]
    pub batch_file: Option<PathBuf>,

    #[serde(default = "TaskMeta::default_brute_file")]
    pub brute_file: PathBuf,

    #[serde(default)]
    pub inline_library: bool,
}

impl TaskMeta {
    pub const INPUTS_DIR: &str = "inputs";
    pub const OUTPUTS_DIR: &str = "outputs";
    pub const GENERATOR_FILE: &str = "gen.cpp";
    pub const RAND_HEADER_FILE: &str = "rand.h";
    pub const BRUTE_FILE: &str = "main_brute.cpp";

    fn default_brute_file() -> PathBuf {
        PathBuf::from(Self::BRUTE_FILE)
    }

    pub fn new(task_name: impl Into<String>, lang: Lang, time_limit_ms: u64) -> Self {
        Self {
            task_name: task_name.into(),
            task_lang: lang.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            task_file: PathBuf::from(lang.default_task_file()),
            time_limit_ms,
            batch_file: None,
            brute_file: Self::default_brute_file(),
            inline_library: false,
        }
    }

    pub fn load(task_dir: impl AsRef<Path>, meta_file_name: &str) -> Result<Self> {
        let path = task_dir.as_ref().join(meta_file_name);
        Ok(fsutil::read_json_with_deserialize(path)?)
    }

    pub fn save(&self, task_dir: impl AsRef<Path>, meta_file_name: &str) -> Result<()> {
        let path = task_dir.as_ref().join(meta_file_name);
        Ok(fsutil::write_json_with_mkdir(path, self)?)
    }

    pub fn lang(&self) -> Result<Lang> {
        self.task_lang
            .parse()
            .map_err(|_| TaskError::UnknownLang(self.task_lang.clone()))
    }

    pub fn count_test_cases(&self) -> usize {
        self.inputs.len()
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn task_file_path(&self, task_dir: impl AsRef<Path>) -> PathBuf {
        task_dir.as_ref().join(&self.task_file)
    }

    pub fn brute_file_path(&self, task_dir: impl AsRef<Path>) -> PathBuf {
        task_dir.as_ref().join(&self.brute_file)
    }

    pub fn batch_file_path(&self, task_dir: impl AsRef<Path>) -> Option<PathBuf> {
        self.batch_file.as_ref().map(|f| task_dir.as_ref().join(f))
    }

    /// A generator is configured and its file still exists.
    pub fn has_batch(&self, task_dir: impl AsRef<Path>) -> bool {
        self.batch_file_path(task_dir)
            .map_or(false, |path| path.is_file())
    }

    /// Pairs every input with the output of the same name, in input order.
    ///
    /// An input without an output becomes an input-only case. Outputs with
    /// no matching input are ignored.
    pub fn case_descriptions(&self, task_dir: impl AsRef<Path>) -> Vec<CaseDescription> {
        let task_dir = task_dir.as_ref();
        let outputs: HashMap<&str, &IoFile> =
            self.outputs.iter().map(|o| (o.name.as_str(), o)).collect();

        for orphan in self
            .outputs
            .iter()
            .filter(|o| !self.inputs.iter().any(|i| i.name == o.name))
        {
            log::warn!("Output {:?} has no matching input; ignored", orphan.path);
        }

        self.inputs
            .iter()
            .map(|input| self.describe_case(task_dir, input, outputs.get(input.name.as_str()).copied()))
            .collect()
    }

    /// The case whose name is `test-<id>`.
    pub fn find_case(&self, task_dir: impl AsRef<Path>, id: usize) -> Option<CaseDescription> {
        let input = self.inputs.iter().find(|i| i.id() == Some(id))?;
        let output = self.outputs.iter().find(|o| o.name == input.name);
        Some(self.describe_case(task_dir.as_ref(), input, output))
    }

    fn describe_case(
        &self,
        task_dir: &Path,
        input: &IoFile,
        output: Option<&IoFile>,
    ) -> CaseDescription {
        let limit = input
            .time_limit_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.time_limit());
        let input_path = task_dir.join(&input.path);
        match output {
            Some(output) => CaseDescription::new(
                &input.name,
                input_path,
                task_dir.join(&output.path),
                input.custom,
                limit,
            ),
            None => CaseDescription::input_only(&input.name, input_path, input.custom, limit),
        }
    }

    fn next_case_id(&self) -> usize {
        self.inputs
            .iter()
            .filter_map(IoFile::id)
            .max()
            .map_or(self.inputs.len(), |id| (id + 1).max(self.inputs.len()))
    }

    /// Copies `input` (and `output`, if any) into the task as a new custom
    /// case and returns its name. The metadata is not saved.
    pub fn add_custom_case(
        &mut self,
        task_dir: impl AsRef<Path>,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> Result<String> {
        let task_dir = task_dir.as_ref();
        let name = format!("test-{}", self.next_case_id());

        let input_path = Path::new(Self::INPUTS_DIR).join(format!("{}.in", name));
        fsutil::copy_file_with_mkdir(input, task_dir.join(&input_path))?;

        if let Some(output) = output {
            let output_path = Path::new(Self::OUTPUTS_DIR).join(format!("{}.ans", name));
            fsutil::copy_file_with_mkdir(output, task_dir.join(&output_path))?;
            self.outputs.push(IoFile::new(&name, output_path, true));
        }

        self.inputs.push(IoFile::new(&name, input_path, true));
        Ok(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_meta() -> TaskMeta {
        let mut meta = TaskMeta::new("A - Sum", Lang::Cpp, 2000);
        for i in 0..2 {
            let name = format!("test-{}", i);
            meta.inputs
                .push(IoFile::new(&name, format!("inputs/{}.in", name), false));
            meta.outputs
                .push(IoFile::new(&name, format!("outputs/{}.ans", name), false));
        }
        meta
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let meta = sample_meta();
        meta.save(dir.path(), "task-meta.json").unwrap();

        let loaded = TaskMeta::load(dir.path(), "task-meta.json").unwrap();
        assert_eq!(loaded, meta);
        assert_eq!(loaded.task_file, Path::new("main.cpp"));
        assert_eq!(loaded.lang().unwrap(), Lang::Cpp);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let json = r#"{
            "task_name": "B",
            "task_lang": "python",
            "inputs": [],
            "outputs": [],
            "task_file": "main.py",
            "time_limit_ms": 1000
        }"#;
        let meta: TaskMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.batch_file, None);
        assert_eq!(meta.brute_file, Path::new("main_brute.cpp"));
        assert!(!meta.inline_library);
    }

    #[test]
    fn has_batch_requires_an_existing_generator() {
        let dir = tempfile::tempdir().unwrap();
        let mut meta = sample_meta();
        assert!(!meta.has_batch(dir.path()));

        meta.batch_file = Some("gen.cpp".into());
        assert!(!meta.has_batch(dir.path()));

        fsutil::write(dir.path().join("gen.cpp"), "int main() {}").unwrap();
        assert!(meta.has_batch(dir.path()));
    }

    #[test]
    fn case_descriptions_pair_inputs_with_outputs() {
        let mut meta = sample_meta();
        meta.inputs[1].time_limit_ms = Some(5000);

        let cases = meta.case_descriptions("/task");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].input, Path::new("/task/inputs/test-0.in"));
        assert_eq!(
            cases[0].expected_output.as_deref(),
            Some(Path::new("/task/outputs/test-0.ans"))
        );
        assert_eq!(cases[0].time_limit, Duration::from_millis(2000));
        assert_eq!(cases[1].time_limit, Duration::from_millis(5000));
    }

    #[test]
    fn cases_are_paired_by_name_not_position() {
        let mut meta = sample_meta();
        meta.outputs.reverse();
        meta.outputs.remove(0);
        meta.outputs
            .push(IoFile::new("test-9", "outputs/test-9.ans", false));

        let cases = meta.case_descriptions("/task");
        assert_eq!(cases.len(), 2);
        assert_eq!(
            cases[0].expected_output.as_deref(),
            Some(Path::new("/task/outputs/test-0.ans"))
        );
        assert_eq!(cases[1].name, "test-1");
        assert_eq!(cases[1].expected_output, None);
    }

    #[test]
    fn find_case_by_id() {
        let meta = sample_meta();
        let case = meta.find_case("/task", 1).unwrap();
        assert_eq!(case.name, "test-1");
        assert_eq!(case.input, Path::new("/task/inputs/test-1.in"));
        assert!(meta.find_case("/task", 7).is_none());
    }

    #[test]
    fn custom_case_gets_next_id() {
        let dir = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        fsutil::write(src.path().join("in.txt"), "1 2\n").unwrap();
        fsutil::write(src.path().join("out.txt"), "3\n").unwrap();

        let mut meta = sample_meta();
        let out = src.path().join("out.txt");
        let name = meta
            .add_custom_case(dir.path(), src.path().join("in.txt"), Some(&out))
            .unwrap();

        assert_eq!(name, "test-2");
        assert_eq!(meta.count_test_cases(), 3);
        assert!(meta.inputs[2].custom && meta.outputs[2].custom);
        assert_eq!(
            fsutil::read_to_string(dir.path().join("inputs/test-2.in")).unwrap(),
            "1 2\n"
        );
        assert_eq!(
            fsutil::read_to_string(dir.path().join("outputs/test-2.ans")).unwrap(),
            "3\n"
        );
    }

    #[test]
    fn input_only_custom_case() {
        let dir = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        fsutil::write(src.path().join("in.txt"), "5\n").unwrap();

        let mut meta = sample_meta();
        let name = meta
            .add_custom_case(dir.path(), src.path().join("in.txt"), None)
            .unwrap();

        assert_eq!(name, "test-2");
        assert_eq!(meta.inputs.len(), 3);
        assert_eq!(meta.outputs.len(), 2);
        assert!(!dir.path().join("outputs/test-2.ans").exists());

        let cases = meta.case_descriptions(dir.path());
        assert_eq!(cases[2].expected_output, None);
        assert!(cases[2].custom);
    }

    #[test]
    fn unknown_lang_is_reported() {
        let mut meta = sample_meta();
        meta.task_lang = "cobol".into();
        assert!(matches!(meta.lang(), Err(TaskError::UnknownLang(l)) if l == "cobol"));
    }
}
