//! Sweep scenarios driven from a TOML sweep file.
//!
//! A recording launcher stands in for the classifier so these run without
//! spawning anything.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use ecsweep_core::{Invocation, Role, SelectionError};
use ecsweep_runner::{
    read_manifest, run_config_path, run_sweep_file, Captured, LaunchError, Launcher, SweepError,
    SweepExecutor, SweepFile, MANIFEST_FILE_NAME, OUTPUT_FILE_NAME,
};

#[derive(Default)]
struct Recorder {
    lines: RefCell<Vec<String>>,
}

impl Launcher for Recorder {
    fn launch(&self, invocation: &Invocation) -> Result<Captured, LaunchError> {
        self.lines.borrow_mut().push(invocation.line().to_string());
        let exit_code = if invocation.tuple_index() == 0 { 1 } else { 0 };
        Ok(Captured {
            stdout: format!("accuracy {}\n", invocation.tuple_index()),
            exit_code: Some(exit_code),
        })
    }
}

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    fn touch(&self, name: &str) -> String {
        let path = self.root.join(name);
        fs::write(&path, "").unwrap();
        path.to_string_lossy().into_owned()
    }

    fn output(&self) -> PathBuf {
        self.root.join("out")
    }

    fn ec1_toml(&self) -> String {
        let classifier = self.touch("ec1.jar");
        let test = self.touch("test.csv");
        let output = self.output();
        format!(
            r#"
[sweep]
run_command = "java -jar"
output_folder = "{output}"

[[classifiers]]
name = "EC1"
path = "{classifier}"

[[classifiers]]
name = "EC2"
path = "/nowhere/ec2.jar"
selected = false

[[configurations]]
name = "grid"
elements = [
  {{ name = "v1", start = 2.0, end = 8.0, step = 2.0 }},
  {{ name = "v2", start = -1.0, end = 2.0, step = 0.25 }},
]

[[configurations]]
name = "unused"
selected = false
elements = [{{ name = "k", value = 1.0 }}]

[[test_sets]]
name = "test"
path = "{test}"
"#,
            output = output.display()
        )
    }
}

fn write_config(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("sweep.toml");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn bdd_scenario_ec1_grid_sweep_end_to_end() {
    // GIVEN a sweep file selecting EC1, a two-variable grid and one test set
    let ws = Workspace::new();
    let config_path = write_config(&ws.root, &ws.ec1_toml());

    // WHEN the sweep runs
    let executor = SweepExecutor::with_launcher(Recorder::default());
    let mut progress_calls = 0;
    let artifacts = run_config_path(&executor, &config_path, |_, total, _, _| {
        assert_eq!(total, 52);
        progress_calls += 1;
    })
    .expect("sweep should succeed");

    // THEN 4 * 13 invocations ran, each once
    assert_eq!(progress_calls, 52);
    assert_eq!(executor.launcher().lines.borrow().len(), 52);
    assert_eq!(artifacts.report.result.len(), 52);

    // AND the output file holds one block per invocation, sorted by command line
    let text = fs::read_to_string(&artifacts.output_path).unwrap();
    assert_eq!(artifacts.output_path, ws.output().join(OUTPUT_FILE_NAME));
    let headers: Vec<&str> = text
        .split("\n\n")
        .filter(|block| !block.is_empty())
        .map(|block| block.lines().next().unwrap())
        .collect();
    assert_eq!(headers.len(), 52);
    let mut sorted = headers.clone();
    sorted.sort_unstable();
    assert_eq!(headers, sorted);

    // AND the manifest records the non-zero exit of the base tuple
    let manifest_path = artifacts.manifest_path.unwrap();
    assert_eq!(manifest_path, ws.output().join(MANIFEST_FILE_NAME));
    let manifest = read_manifest(&manifest_path).unwrap();
    assert!(manifest.classifier.ends_with("ec1.jar"));
    assert_eq!(manifest.configuration, "grid");
    assert_eq!(manifest.tuple_count, 52);
    assert_eq!(manifest.invocation_count, 52);
    assert_eq!(manifest.nonzero_exits, 1);
    assert!(manifest.train_paths.is_empty());
}

#[test]
fn bdd_scenario_missing_files_are_all_reported() {
    // GIVEN a sweep file whose classifier and test set do not exist
    let ws = Workspace::new();
    let text = r#"
[[classifiers]]
name = "EC1"
path = "/nowhere/ec1.jar"

[[configurations]]
name = "c"
elements = [{ name = "k", value = 1.0 }]

[[test_sets]]
name = "t"
path = "/nowhere/t.csv"
"#;
    let config_path = write_config(&ws.root, text);

    // WHEN the sweep is attempted
    let executor = SweepExecutor::with_launcher(Recorder::default());
    let err = run_config_path(&executor, &config_path, |_, _, _, _| {}).unwrap_err();

    // THEN both missing items are named and nothing was launched
    match err {
        SweepError::Paths(paths) => {
            let names: Vec<&str> = paths.missing.iter().map(|i| i.name.as_str()).collect();
            assert_eq!(names, vec!["EC1", "t"]);
        }
        other => panic!("expected path error, got {other}"),
    }
    assert!(executor.launcher().lines.borrow().is_empty());
}

#[test]
fn bdd_scenario_no_test_set_selected() {
    // GIVEN a sweep file with every test set deselected
    let ws = Workspace::new();
    let text = ws.ec1_toml().replace(
        "name = \"test\"\n",
        "name = \"test\"\nselected = false\n",
    );
    let file = SweepFile::from_toml(&text).unwrap();

    // WHEN it is resolved
    let executor = SweepExecutor::with_launcher(Recorder::default());
    let err = run_sweep_file(&executor, &file, |_, _, _, _| {}).unwrap_err();

    // THEN the missing role is reported and no output folder appears
    match err {
        SweepError::Selection(e) => {
            assert_eq!(e, SelectionError::AtLeastOneRequired { role: Role::TestSet });
        }
        other => panic!("expected selection error, got {other}"),
    }
    assert!(!ws.output().exists());
}

#[test]
fn bdd_scenario_invalid_range_is_rejected() {
    // GIVEN a configuration whose start lies after its end
    let ws = Workspace::new();
    let text = ws
        .ec1_toml()
        .replace("start = 2.0, end = 8.0", "start = 9.0, end = 8.0");
    let file = SweepFile::from_toml(&text).unwrap();

    // WHEN it is resolved
    let err = file.resolve().unwrap_err();

    // THEN the element error names the offending variable
    assert!(matches!(err, SweepError::Element(_)));
    assert!(err.to_string().contains("v1"));
}
