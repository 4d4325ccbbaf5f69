//! Parallel compilation scheduling
//!
//! Compiles the target's sources on a bounded pool of worker threads.
//! Every source compiles independently. Completion order is unspecified,
//! but the report is always aligned with the input source list.
//!
//! Failure policy: the first failed job stops new jobs from starting.
//! Jobs already running finish normally. Nothing is retried.

use crate::error::{BuildError, BuildResult};
use crate::targets::BuildTarget;
use crate::toolchain::Compiler;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Extension of generated object files
const OBJECT_EXTENSION: &str = "o";

/// One source file compiled to one object file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationJob {
    /// Source as listed in the build target
    pub source: PathBuf,
    /// File handed to the compiler
    pub input: PathBuf,
    pub object: PathBuf,
    pub flags: Vec<String>,
}

/// Jobs known to the scheduler, keyed by target source
#[derive(Debug, Clone, Default)]
pub struct JobTable {
    jobs: HashMap<PathBuf, CompilationJob>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan one job per target source.
    ///
    /// Objects mirror the source layout under `object_dir`. A Cython interface
    /// compiles through the C++ file generated next to it.
    pub fn plan(target: &BuildTarget, root: &Path, object_dir: &Path) -> Self {
        let mut table = Self::new();
        for source in &target.sources {
            let input = if source.extension().and_then(|e| e.to_str()) == Some("pyx") {
                root.join(source.with_extension("cpp"))
            } else {
                root.join(source)
            };

            table.insert(CompilationJob {
                source: source.clone(),
                input,
                object: object_dir.join(source.with_extension(OBJECT_EXTENSION)),
                flags: target.compiler_flags.clone(),
            });
        }
        table
    }

    pub fn insert(&mut self, job: CompilationJob) {
        self.jobs.insert(job.source.clone(), job);
    }

    pub fn get(&self, source: &Path) -> Option<&CompilationJob> {
        self.jobs.get(source)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// What happened to one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Object file produced
    Compiled { object: PathBuf },
    /// Source has no job in the table
    Skipped,
    /// Compiler reported an error
    Failed { object: PathBuf, error: String },
    /// Not started because an earlier failure halted scheduling
    NotScheduled { object: PathBuf },
}

impl JobOutcome {
    /// Object path this slot was meant to produce
    pub fn intended_object(&self) -> Option<&Path> {
        match self {
            Self::Compiled { object }
            | Self::Failed { object, .. }
            | Self::NotScheduled { object } => Some(object),
            Self::Skipped => None,
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Compiled { .. })
    }
}

/// Result of one scheduler run, aligned with the input sources
#[derive(Debug, Clone)]
pub struct ScheduleReport {
    pub sources: Vec<PathBuf>,
    pub outcomes: Vec<JobOutcome>,
    /// Worker threads used
    pub workers: usize,
}

impl ScheduleReport {
    /// Every intended object path in source order, `None` for skipped slots
    pub fn object_paths(&self) -> Vec<Option<PathBuf>> {
        self.outcomes
            .iter()
            .map(|o| o.intended_object().map(Path::to_path_buf))
            .collect()
    }

    /// Objects that actually exist, paired with their sources
    pub fn compiled_objects(&self) -> Vec<(&Path, &Path)> {
        self.sources
            .iter()
            .zip(&self.outcomes)
            .filter_map(|(source, outcome)| match outcome {
                JobOutcome::Compiled { object } => Some((source.as_path(), object.as_path())),
                _ => None,
            })
            .collect()
    }

    pub fn compiled_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_compiled()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, JobOutcome::Skipped))
            .count()
    }

    /// First failure in source order
    pub fn first_failure(&self) -> Option<(&Path, &str)> {
        self.sources
            .iter()
            .zip(&self.outcomes)
            .find_map(|(source, outcome)| match outcome {
                JobOutcome::Failed { error, .. } => Some((source.as_path(), error.as_str())),
                _ => None,
            })
    }

    pub fn is_success(&self) -> bool {
        self.first_failure().is_none()
    }

    /// Turn a failed run into a compilation error
    pub fn into_result(self) -> BuildResult<Self> {
        if let Some((source, error)) = self.first_failure() {
            return Err(BuildError::compilation(source, error));
        }
        Ok(self)
    }
}

/// Bounded-parallelism compilation scheduler
#[derive(Debug, Clone)]
pub struct Scheduler {
    workers: usize,
}

impl Scheduler {
    /// Scheduler with a fixed pool size (at least one worker)
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Scheduler sized to the host's physical cores
    pub fn with_physical_cores() -> Self {
        Self::new(num_cpus::get_physical())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Compile `sources` using the jobs in `table`.
    ///
    /// The pool lives for this call only; its threads are joined before
    /// returning.
    pub fn run(
        &self,
        sources: &[PathBuf],
        table: &JobTable,
        compiler: &dyn Compiler,
    ) -> BuildResult<ScheduleReport> {
        debug!(workers = self.workers, jobs = sources.len(), "Starting compilation pool");

        let halted = AtomicBool::new(false);

        let outcomes = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("mn-compile-{}", i))
            .build_scoped(
                |thread| thread.run(),
                |pool| {
                    pool.install(|| {
                        sources
                            .par_iter()
                            .map(|source| run_job(source, table, compiler, &halted))
                            .collect::<Vec<_>>()
                    })
                },
            )
            .map_err(|e| BuildError::ThreadPool(e.to_string()))?;

        Ok(ScheduleReport {
            sources: sources.to_vec(),
            outcomes,
            workers: self.workers,
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::with_physical_cores()
    }
}

fn run_job(
    source: &Path,
    table: &JobTable,
    compiler: &dyn Compiler,
    halted: &AtomicBool,
) -> JobOutcome {
    let Some(job) = table.get(source) else {
        warn!(source = %source.display(), "No compilation job for source, skipping");
        return JobOutcome::Skipped;
    };

    if halted.load(Ordering::SeqCst) {
        return JobOutcome::NotScheduled {
            object: job.object.clone(),
        };
    }

    debug!(source = %source.display(), "Compiling");
    match compiler.compile(job) {
        Ok(()) => JobOutcome::Compiled {
            object: job.object.clone(),
        },
        Err(error) => {
            if !halted.swap(true, Ordering::SeqCst) {
                warn!(source = %source.display(), %error, "Compilation failed, halting scheduling");
            }
            JobOutcome::Failed {
                object: job.object.clone(),
                error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct RecordingCompiler {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl Compiler for RecordingCompiler {
        fn compile(&self, job: &CompilationJob) -> Result<(), String> {
            self.calls.lock().unwrap().push(job.source.clone());
            Ok(())
        }
    }

    fn job(source: &str) -> CompilationJob {
        CompilationJob {
            source: PathBuf::from(source),
            input: PathBuf::from(source),
            object: PathBuf::from(source).with_extension("o"),
            flags: Vec::new(),
        }
    }

    #[test]
    fn test_scheduler_minimum_one_worker() {
        assert_eq!(Scheduler::new(0).workers(), 1);
        assert!(Scheduler::with_physical_cores().workers() >= 1);
    }

    #[test]
    fn test_every_known_source_compiled_once() {
        let sources: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("s{i}.cpp"))).collect();
        let mut table = JobTable::new();
        for source in &sources {
            table.insert(job(source.to_str().unwrap()));
        }
        let compiler = RecordingCompiler {
            calls: Mutex::new(Vec::new()),
        };

        let report = Scheduler::new(3).run(&sources, &table, &compiler).unwrap();

        let mut calls = compiler.calls.into_inner().unwrap();
        calls.sort();
        let mut expected = sources.clone();
        expected.sort();
        assert_eq!(calls, expected);
        assert_eq!(report.compiled_count(), 8);
        assert_eq!(report.workers, 3);
    }

    #[test]
    fn test_empty_source_list() {
        let compiler = RecordingCompiler {
            calls: Mutex::new(Vec::new()),
        };
        let report = Scheduler::new(2).run(&[], &JobTable::new(), &compiler).unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.is_success());
    }

    #[test]
    fn test_failed_job_halts_sequential_pool() {
        struct FailSecond(AtomicUsize);
        impl Compiler for FailSecond {
            fn compile(&self, _job: &CompilationJob) -> Result<(), String> {
                if self.0.fetch_add(1, Ordering::SeqCst) == 1 {
                    Err("boom".to_string())
                } else {
                    Ok(())
                }
            }
        }

        let names = ["a.cpp", "b.cpp", "c.cpp", "d.cpp"];
        let sources: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        let mut table = JobTable::new();
        for name in names {
            table.insert(job(name));
        }
        let compiler = FailSecond(AtomicUsize::new(0));

        let report = Scheduler::new(1).run(&sources, &table, &compiler).unwrap();

        // One worker runs jobs one at a time, so nothing starts after the failure
        assert_eq!(compiler.0.load(Ordering::SeqCst), 2);
        assert_eq!(report.compiled_count(), 1);
        assert_eq!(
            report
                .outcomes
                .iter()
                .filter(|o| matches!(o, JobOutcome::NotScheduled { .. }))
                .count(),
            2
        );
        assert_eq!(report.first_failure().map(|(_, e)| e), Some("boom"));
    }

    #[test]
    fn test_into_result_maps_failure() {
        let report = ScheduleReport {
            sources: vec![PathBuf::from("a.cpp"), PathBuf::from("b.cpp")],
            outcomes: vec![
                JobOutcome::Compiled {
                    object: PathBuf::from("a.o"),
                },
                JobOutcome::Failed {
                    object: PathBuf::from("b.o"),
                    error: "syntax error".to_string(),
                },
            ],
            workers: 1,
        };

        match report.into_result().unwrap_err() {
            BuildError::Compilation { source_file, error } => {
                assert_eq!(source_file, PathBuf::from("b.cpp"));
                assert_eq!(error, "syntax error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_object_paths_keep_skipped_slots() {
        let report = ScheduleReport {
            sources: vec![PathBuf::from("a.cpp"), PathBuf::from("x.cpp")],
            outcomes: vec![
                JobOutcome::Compiled {
                    object: PathBuf::from("a.o"),
                },
                JobOutcome::Skipped,
            ],
            workers: 1,
        };

        assert_eq!(report.object_paths(), vec![Some(PathBuf::from("a.o")), None]);
        assert_eq!(report.compiled_objects().len(), 1);
        assert_eq!(report.skipped_count(), 1);
    }
}
