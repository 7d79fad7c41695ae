//! Output staleness tracking
//!
//! Every task that completed with actual work leaves one small record under
//! a user-scoped history root. The record holds the completion time in
//! milliseconds since the epoch; its absence means the task never completed.
//! Records of one build live under the hex SHA-256 of the build root's
//! canonical path: project segments become `.d` directories and the task a
//! `.ts` file (`:a:build` is stored in `a.d/build.ts`).

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use girder_core::config::{Config, HISTORY_DIR_NAME};
use girder_core::error::{ConventionError, TaskError};
use girder_core::project::{Project, Workspace};
use girder_core::task::{Task, TaskPath};

/// Why a task has to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// No declared output exists on disk
    NoOutput,
    /// No successful execution is recorded
    NeverExecuted,
    /// The history could not be read
    HistoryUnreadable,
    /// A predecessor produced output after this task last ran
    PredecessorNewer(TaskPath),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::NoOutput => write!(f, "no output exists"),
            StaleReason::NeverExecuted => write!(f, "never executed"),
            StaleReason::HistoryUnreadable => write!(f, "history unreadable"),
            StaleReason::PredecessorNewer(path) => write!(f, "output of {} is newer", path),
        }
    }
}

/// Result of a staleness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale(_))
    }
}

/// Task history errors
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A predecessor wired for output timestamps has no record
    #[error("Task {task} depends on the output of {predecessor}, which has no recorded output")]
    MissingPredecessorOutput {
        task: TaskPath,
        predecessor: TaskPath,
    },

    #[error("Failed to read task history {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt task history record {}: '{content}'", path.display())]
    Corrupt { path: PathBuf, content: String },

    #[error("Failed to write task history {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove task history {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Convention(#[from] ConventionError),

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// One persisted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub task: String,
    pub timestamp: u64,
}

impl HistoryRecord {
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp as i64).single()
    }
}

/// History of one build root
#[derive(Debug, Default)]
pub struct HistoryStats {
    /// Directory holding the records
    pub dir: PathBuf,
    /// Records ordered by task
    pub records: Vec<HistoryRecord>,
}

impl HistoryStats {
    /// Most recent completion
    pub fn newest(&self) -> Option<DateTime<Utc>> {
        self.records
            .iter()
            .max_by_key(|r| r.timestamp)
            .and_then(HistoryRecord::recorded_at)
    }
}

/// Persists task completion times and answers staleness questions
#[derive(Debug, Clone)]
pub struct OutputStalenessTracker {
    history_root: PathBuf,
}

impl OutputStalenessTracker {
    pub fn new(history_root: impl Into<PathBuf>) -> Self {
        Self {
            history_root: history_root.into(),
        }
    }

    /// Tracker rooted in the history directory of a user home
    pub fn from_user_home(user_home: &Path) -> Self {
        Self::new(user_home.join(HISTORY_DIR_NAME))
    }

    pub fn history_root(&self) -> &Path {
        &self.history_root
    }

    /// Directory holding every record of one build root
    pub fn build_dir(&self, root_dir: &Path) -> PathBuf {
        let canonical = canonicalize(root_dir);
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string_lossy().as_bytes());
        self.history_root
            .join(format!("{:x}", hasher.finalize()))
    }

    /// Location of the record of one task
    pub fn history_path(&self, root_dir: &Path, task: &TaskPath) -> PathBuf {
        self.build_dir(root_dir).join(task.history_segments())
    }

    /// Location of a record, refusing task paths that would leave the build
    /// directory
    fn record_path(&self, root_dir: &Path, task: &TaskPath) -> Result<PathBuf, HistoryError> {
        if !task.is_well_formed() {
            return Err(TaskError::InvalidPath(task.to_string()).into());
        }
        Ok(self.history_path(root_dir, task))
    }

    /// Read the recorded completion time; `None` when never recorded
    pub fn read_timestamp(
        &self,
        root_dir: &Path,
        task: &TaskPath,
    ) -> Result<Option<u64>, HistoryError> {
        let path = self.record_path(root_dir, task)?;
        read_record(&path)
    }

    /// Atomically replace the record of a task
    pub fn write_timestamp(
        &self,
        root_dir: &Path,
        task: &TaskPath,
        timestamp: u64,
    ) -> Result<(), HistoryError> {
        let path = self.record_path(root_dir, task)?;
        let write_err = |source| HistoryError::Write {
            path: path.clone(),
            source,
        };

        let dir = path.parent().unwrap_or(&self.history_root);
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
        write!(file, "{}", timestamp).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        file.persist(&path).map_err(|e| write_err(e.error))?;

        debug!(task = %task, timestamp, path = %path.display(), "recorded task history");
        Ok(())
    }

    /// Decide whether a task must run.
    ///
    /// Read failures make the task stale; a predecessor without a record is an
    /// error.
    pub fn is_stale(
        &self,
        project: &Project,
        task: &Task,
        predecessors: &[TaskPath],
    ) -> Result<Staleness, HistoryError> {
        let root_dir = project.root_dir();

        if !task.output_exists(project)? {
            debug!(task = %task.path(), "no output exists");
            return Ok(Staleness::Stale(StaleReason::NoOutput));
        }

        let own = match self.read_timestamp(root_dir, task.path()) {
            Ok(Some(timestamp)) => timestamp,
            Ok(None) => return Ok(Staleness::Stale(StaleReason::NeverExecuted)),
            Err(e) => {
                warn!(task = %task.path(), error = %e, "treating task as stale");
                return Ok(Staleness::Stale(StaleReason::HistoryUnreadable));
            }
        };

        let mut newer = None;
        for predecessor in predecessors {
            let timestamp = match self.read_timestamp(root_dir, predecessor) {
                Ok(Some(timestamp)) => timestamp,
                Ok(None) => {
                    return Err(HistoryError::MissingPredecessorOutput {
                        task: task.path().clone(),
                        predecessor: predecessor.clone(),
                    })
                }
                Err(e) => {
                    warn!(task = %task.path(), predecessor = %predecessor, error = %e, "treating task as stale");
                    return Ok(Staleness::Stale(StaleReason::HistoryUnreadable));
                }
            };
            if timestamp > own && newer.is_none() {
                newer = Some(predecessor.clone());
            }
        }

        Ok(match newer {
            Some(predecessor) => Staleness::Stale(StaleReason::PredecessorNewer(predecessor)),
            None => Staleness::Fresh,
        })
    }

    /// Record a successful execution; a task that did no work keeps its
    /// previous record. Returns the written timestamp.
    pub fn record_success(&self, root_dir: &Path, task: &Task) -> Result<Option<u64>, HistoryError> {
        if !task.did_work() {
            debug!(task = %task.path(), "task did no work, keeping history");
            return Ok(None);
        }
        let now = Utc::now().timestamp_millis().max(1) as u64;
        self.write_timestamp(root_dir, task.path(), now)?;
        Ok(Some(now))
    }

    /// Forget a task after a failed execution. Returns whether a record
    /// existed.
    pub fn record_failure(&self, root_dir: &Path, task: &TaskPath) -> Result<bool, HistoryError> {
        let path = self.record_path(root_dir, task)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(task = %task, "removed task history");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(HistoryError::Remove { path, source }),
        }
    }

    /// Make a task skip its actions while its output is fresh
    pub fn skip_when_fresh(&self, task: &mut Task, predecessors: Vec<TaskPath>) {
        let tracker = self.clone();
        task.only_if(move |ctx| {
            let staleness = tracker.is_stale(ctx.project, ctx.task, &predecessors)?;
            if let Staleness::Stale(reason) = &staleness {
                debug!(task = %ctx.task.path(), reason = %reason, "task is stale");
            }
            Ok(staleness.is_stale())
        });
    }

    /// Attach the staleness predicate to every task declaring outputs.
    ///
    /// The `stale_after` tasks of the build file become both output
    /// predecessors and dependencies. Returns the number of tracked tasks.
    pub fn track_declared_outputs(
        &self,
        workspace: &mut Workspace,
        config: &Config,
    ) -> Result<usize, HistoryError> {
        let mut tracked = 0;
        for path in workspace.task_paths() {
            let predecessors = config
                .project(path.project.as_str())
                .and_then(|project| project.task(&path.name))
                .map(|task| {
                    task.stale_after
                        .iter()
                        .map(|p| TaskPath::resolve(&path.project, p))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();

            let task = workspace.task_mut(&path)?;
            if task.outputs().is_empty() {
                continue;
            }
            for predecessor in &predecessors {
                task.depends_on(predecessor.clone());
            }
            self.skip_when_fresh(task, predecessors);
            tracked += 1;
        }
        debug!(tracked, "tracking task outputs");
        Ok(tracked)
    }

    /// Every record of a build root
    pub fn status(&self, root_dir: &Path) -> Result<HistoryStats, HistoryError> {
        let dir = self.build_dir(root_dir);
        let mut stats = HistoryStats {
            dir: dir.clone(),
            records: Vec::new(),
        };
        if !dir.exists() {
            return Ok(stats);
        }

        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| HistoryError::Read {
                path: dir.clone(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let relative = entry.path().strip_prefix(&dir).unwrap_or(entry.path());
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let Some(task) = TaskPath::from_history_segments(segments.iter().map(String::as_str))
            else {
                continue;
            };
            let Some(timestamp) = read_record(entry.path())? else {
                continue;
            };
            stats.records.push(HistoryRecord {
                task: task.to_string(),
                timestamp,
            });
        }
        Ok(stats)
    }

    /// Remove every record of a build root. Returns the number of records
    /// removed.
    pub fn clear(&self, root_dir: &Path) -> Result<usize, HistoryError> {
        let stats = self.status(root_dir)?;
        if stats.dir.exists() {
            fs::remove_dir_all(&stats.dir).map_err(|source| HistoryError::Remove {
                path: stats.dir.clone(),
                source,
            })?;
        }
        info!(removed = stats.records.len(), dir = %stats.dir.display(), "cleared task history");
        Ok(stats.records.len())
    }
}

fn read_record(path: &Path) -> Result<Option<u64>, HistoryError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(HistoryError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let timestamp: u64 = content
        .trim()
        .parse()
        .map_err(|_| HistoryError::Corrupt {
            path: path.to_path_buf(),
            content: content.clone(),
        })?;
    Ok((timestamp != 0).then_some(timestamp))
}

/// Resolve symlinks when the directory exists, otherwise normalize the
/// absolute path lexically
fn canonicalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use girder_core::config::{ProjectConfig, TaskConfig};
    use girder_core::conventions::ConventionAware;
    use girder_core::plugins::PluginRegistry;
    use girder_core::project::ProjectPath;
    use tempfile::TempDir;

    fn t(s: &str) -> TaskPath {
        TaskPath::parse(s).unwrap()
    }

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
        tracker: OutputStalenessTracker,
        project: Project,
    }

    /// Root project with task `compile` whose output is `out.txt`
    fn fixture(with_output: bool) -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("build-root");
        fs::create_dir_all(&root).unwrap();
        let tracker = OutputStalenessTracker::new(temp.path().join("history"));

        let mut project = Project::new(ProjectPath::root(), &root, &root);
        let task = project.tasks.add("compile").unwrap();
        task.convention_mapping_mut()
            .set("outputFile", root.join("out.txt"));
        task.declare_output("outputFile");
        project.tasks.add("generate").unwrap();
        project.tasks.add("resources").unwrap();

        if with_output {
            fs::write(root.join("out.txt"), "compiled").unwrap();
        }
        Fixture {
            _temp: temp,
            root,
            tracker,
            project,
        }
    }

    fn staleness(f: &Fixture, predecessors: &[TaskPath]) -> Result<Staleness, HistoryError> {
        let task = f.project.tasks.get("compile").unwrap();
        f.tracker.is_stale(&f.project, task, predecessors)
    }

    #[test]
    fn test_history_path_layout() {
        let tracker = OutputStalenessTracker::new("/home/.history");
        let path = tracker.history_path(Path::new("/r"), &t(":a:build"));

        assert!(path.starts_with("/home/.history"));
        assert!(path.ends_with("a.d/build.ts"));
        assert_eq!(path, tracker.history_path(Path::new("/r"), &t(":a:build")));
        assert_ne!(path, tracker.history_path(Path::new("/s"), &t(":a:build")));
        // hex digest directory
        let digest = path
            .strip_prefix("/home/.history")
            .unwrap()
            .components()
            .next()
            .unwrap();
        assert_eq!(digest.as_os_str().len(), 64);
    }

    #[test]
    fn test_record_cannot_leave_the_history_root() {
        let temp = TempDir::new().unwrap();
        let history = temp.path().join("history");
        let tracker = OutputStalenessTracker::new(&history);
        let root = temp.path().join("r");
        let escaped = TaskPath::new(ProjectPath::root(), "../../escaped");

        let err = tracker.write_timestamp(&root, &escaped, 100).unwrap_err();
        assert!(matches!(err, HistoryError::Task(TaskError::InvalidPath(_))));
        assert!(tracker.read_timestamp(&root, &escaped).is_err());
        assert!(tracker.record_failure(&root, &escaped).is_err());

        let leftovers: Vec<_> = WalkDir::new(temp.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
    }

    #[test]
    fn test_task_and_subproject_of_same_name() {
        let temp = TempDir::new().unwrap();
        let tracker = OutputStalenessTracker::new(temp.path().join("history"));
        let root = temp.path().join("r");

        tracker.write_timestamp(&root, &t(":a:build"), 100).unwrap();
        tracker.write_timestamp(&root, &t(":a:build:jar"), 200).unwrap();

        assert_eq!(tracker.read_timestamp(&root, &t(":a:build")).unwrap(), Some(100));
        assert_eq!(tracker.read_timestamp(&root, &t(":a:build:jar")).unwrap(), Some(200));
        let mut tasks: Vec<String> = tracker
            .status(&root)
            .unwrap()
            .records
            .into_iter()
            .map(|r| r.task)
            .collect();
        tasks.sort();
        assert_eq!(tasks, vec![":a:build", ":a:build:jar"]);
    }

    #[test]
    fn test_history_path_lexical_normalization() {
        let tracker = OutputStalenessTracker::new("/h");
        assert_eq!(
            tracker.history_path(Path::new("/no/such/r/./x/.."), &t(":build")),
            tracker.history_path(Path::new("/no/such/r"), &t(":build"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_history_path_stable_across_symlinks() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("r");
        fs::create_dir_all(&root).unwrap();
        let alias = temp.path().join("alias");
        std::os::unix::fs::symlink(&root, &alias).unwrap();

        let tracker = OutputStalenessTracker::new(temp.path().join("history"));
        assert_eq!(
            tracker.history_path(&root, &t(":a:build")),
            tracker.history_path(&alias, &t(":a:build"))
        );
    }

    #[test]
    fn test_timestamp_round_trip() {
        let f = fixture(true);
        let timestamp = 1_700_000_000_123;
        f.tracker
            .write_timestamp(&f.root, &t(":compile"), timestamp)
            .unwrap();

        assert_eq!(
            f.tracker.read_timestamp(&f.root, &t(":compile")).unwrap(),
            Some(timestamp)
        );
        let content = fs::read_to_string(f.tracker.history_path(&f.root, &t(":compile"))).unwrap();
        assert_eq!(content, "1700000000123");
    }

    #[test]
    fn test_zero_means_never_recorded() {
        let f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 0).unwrap();

        assert_eq!(f.tracker.read_timestamp(&f.root, &t(":compile")).unwrap(), None);
        assert_eq!(
            staleness(&f, &[]).unwrap(),
            Staleness::Stale(StaleReason::NeverExecuted)
        );
    }

    #[test]
    fn test_stale_without_output() {
        let f = fixture(false);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();
        assert_eq!(
            staleness(&f, &[]).unwrap(),
            Staleness::Stale(StaleReason::NoOutput)
        );
    }

    #[test]
    fn test_stale_when_never_executed() {
        let f = fixture(true);
        assert_eq!(
            staleness(&f, &[]).unwrap(),
            Staleness::Stale(StaleReason::NeverExecuted)
        );
    }

    #[test]
    fn test_fresh_when_predecessor_older() {
        let f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();
        f.tracker.write_timestamp(&f.root, &t(":generate"), 99).unwrap();

        assert_eq!(staleness(&f, &[t(":generate")]).unwrap(), Staleness::Fresh);
    }

    #[test]
    fn test_fresh_when_predecessor_same_time() {
        let f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();
        f.tracker.write_timestamp(&f.root, &t(":generate"), 100).unwrap();

        assert_eq!(staleness(&f, &[t(":generate")]).unwrap(), Staleness::Fresh);
    }

    #[test]
    fn test_stale_when_predecessor_newer() {
        let f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();
        f.tracker.write_timestamp(&f.root, &t(":generate"), 50).unwrap();
        f.tracker.write_timestamp(&f.root, &t(":resources"), 101).unwrap();

        assert_eq!(
            staleness(&f, &[t(":generate"), t(":resources")]).unwrap(),
            Staleness::Stale(StaleReason::PredecessorNewer(t(":resources")))
        );
    }

    #[test]
    fn test_missing_predecessor_output_is_an_error() {
        let f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();

        let err = staleness(&f, &[t(":generate")]).unwrap_err();
        match err {
            HistoryError::MissingPredecessorOutput { task, predecessor } => {
                assert_eq!(task, t(":compile"));
                assert_eq!(predecessor, t(":generate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unreadable_history_is_stale() {
        let f = fixture(true);
        let path = f.tracker.history_path(&f.root, &t(":compile"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "yesterday").unwrap();

        assert!(matches!(
            f.tracker.read_timestamp(&f.root, &t(":compile")),
            Err(HistoryError::Corrupt { .. })
        ));
        assert_eq!(
            staleness(&f, &[]).unwrap(),
            Staleness::Stale(StaleReason::HistoryUnreadable)
        );
    }

    #[test]
    fn test_record_success_without_work_keeps_timestamp() {
        let mut f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();

        let task = f.project.tasks.get_mut("compile").unwrap();
        task.set_did_work(false);
        assert_eq!(f.tracker.record_success(&f.root, task).unwrap(), None);
        assert_eq!(
            f.tracker.read_timestamp(&f.root, &t(":compile")).unwrap(),
            Some(100)
        );
    }

    #[test]
    fn test_record_success_with_work_writes_now() {
        let mut f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();

        let task = f.project.tasks.get_mut("compile").unwrap();
        task.set_did_work(true);
        let written = f.tracker.record_success(&f.root, task).unwrap().unwrap();
        assert!(written > 100);
        assert_eq!(
            f.tracker.read_timestamp(&f.root, &t(":compile")).unwrap(),
            Some(written)
        );
        assert_eq!(staleness(&f, &[]).unwrap(), Staleness::Fresh);
    }

    #[test]
    fn test_record_failure_removes_record() {
        let f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();

        assert!(f.tracker.record_failure(&f.root, &t(":compile")).unwrap());
        assert!(!f.tracker.record_failure(&f.root, &t(":compile")).unwrap());
        assert!(staleness(&f, &[]).unwrap().is_stale());
    }

    #[test]
    fn test_status_and_clear() {
        let f = fixture(true);
        f.tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();
        f.tracker.write_timestamp(&f.root, &t(":generate"), 200).unwrap();
        f.tracker.write_timestamp(&f.root, &t(":core:compile"), 150).unwrap();

        let stats = f.tracker.status(&f.root).unwrap();
        let tasks: Vec<&str> = stats.records.iter().map(|r| r.task.as_str()).collect();
        // temp files of atomic writes never linger
        assert_eq!(tasks, vec![":compile", ":core:compile", ":generate"]);
        assert_eq!(stats.newest().unwrap().timestamp_millis(), 200);

        assert_eq!(f.tracker.clear(&f.root).unwrap(), 3);
        assert!(f.tracker.status(&f.root).unwrap().records.is_empty());
        assert_eq!(f.tracker.clear(&f.root).unwrap(), 0);
    }

    #[test]
    fn test_skip_when_fresh() {
        let mut f = fixture(true);
        let tracker = f.tracker.clone();
        tracker.skip_when_fresh(f.project.tasks.get_mut("compile").unwrap(), Vec::new());

        let task = f.project.tasks.get("compile").unwrap();
        assert!(task.should_run(&f.project).unwrap());

        tracker.write_timestamp(&f.root, &t(":compile"), 100).unwrap();
        let task = f.project.tasks.get("compile").unwrap();
        assert!(!task.should_run(&f.project).unwrap());
    }

    #[test]
    fn test_track_declared_outputs() {
        let temp = TempDir::new().unwrap();
        let mut core = ProjectConfig::new(":core");
        core.tasks
            .push(TaskConfig::new("compile").with_output("classes", "build/classes"));
        core.tasks.push(TaskConfig::new("lint"));
        let mut app = ProjectConfig::new(":app");
        app.tasks.push(
            TaskConfig::new("compile")
                .with_output("classes", "build/classes")
                .with_stale_after(":core:compile"),
        );
        let config = Config {
            projects: vec![core, app],
            ..Default::default()
        };

        let mut workspace =
            Workspace::from_config(temp.path(), &config, &PluginRegistry::with_builtins()).unwrap();
        let tracker = OutputStalenessTracker::new(temp.path().join("history"));

        assert_eq!(tracker.track_declared_outputs(&mut workspace, &config).unwrap(), 2);
        let compile = workspace.task(&t(":app:compile")).unwrap();
        assert!(compile.has_predicate());
        assert!(compile.dependencies().contains(&t(":core:compile")));
        assert!(!workspace.task(&t(":core:lint")).unwrap().has_predicate());
    }
}
