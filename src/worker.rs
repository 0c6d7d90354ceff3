//! Background export so that the GUI stays responsive.
//!
//! A job always writes to a file, on-screen previews are rendered on the
//! UI thread. Cancellation is checked between the load, build and save
//! stages; a stage that already started runs to its end.

use crate::{EmgError, EmgResult, EmgTable, Figure, PlotOptions, RenderReport};
use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct PlotJob {
    pub csvin: PathBuf,
    pub fout: PathBuf,
    pub options: PlotOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress(String),
    Finished(RenderReport),
    Failed(String),
}

pub struct PlotWorker {
    events: Receiver<WorkerEvent>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PlotWorker {
    pub fn spawn(job: PlotJob) -> PlotWorker {
        let (tx, rx) = unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let handle = std::thread::spawn(move || {
            let event = match run(&job, &tx, &flag) {
                Ok(report) => WorkerEvent::Finished(report),
                Err(e) => {
                    error!("plot job for {} failed: {}", job.csvin.display(), e);
                    WorkerEvent::Failed(e.to_string())
                }
            };
            // the receiver may be gone if the window closed
            let _ = tx.send(event);
        });
        PlotWorker {
            events: rx,
            cancel,
            handle: Some(handle),
        }
    }

    /// next pending event, if any
    pub fn try_recv(&self) -> Option<WorkerEvent> {
        match self.events.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// blocks until the next event, None once the job is over and drained
    pub fn recv(&self) -> Option<WorkerEvent> {
        self.events.recv().ok()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// waits for the thread, events not yet received stay readable
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("plot worker panicked");
            }
        }
    }
}

fn run(job: &PlotJob, tx: &Sender<WorkerEvent>, cancel: &AtomicBool) -> EmgResult<RenderReport> {
    let progress = |msg: String| {
        debug!("{}", msg);
        let _ = tx.send(WorkerEvent::Progress(msg));
    };
    let check = || {
        if cancel.load(Ordering::SeqCst) {
            Err(EmgError::Cancelled)
        } else {
            Ok(())
        }
    };

    progress("Starting plot generation...".to_string());
    job.options.validate()?;
    progress(format!("Loading {}", job.csvin.display()));
    let table = EmgTable::from_csv(&job.csvin, &job.options.stim_col)?;
    check()?;
    progress(format!("Building figure from {} rows", table.len()));
    let figure = Figure::build(&table, &job.options)?;
    check()?;
    progress(format!("Writing {}", job.fout.display()));
    let report = figure.save(&job.options, &job.fout)?;
    progress("Plot generation completed!".to_string());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{write_csv_file, SynthConfig};

    fn collect(worker: &mut PlotWorker) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        while let Some(ev) = worker.recv() {
            events.push(ev);
        }
        worker.join();
        events
    }

    #[test]
    fn job_reports_progress_then_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let csvin = dir.path().join("emg.csv");
        write_csv_file(&csvin, &SynthConfig { samples: 50, ..Default::default() }).unwrap();
        let fout = dir.path().join("trace.svg");
        let mut worker = PlotWorker::spawn(PlotJob {
            csvin,
            fout: fout.clone(),
            options: PlotOptions::default(),
        });
        let events = collect(&mut worker);
        assert!(matches!(events.first(), Some(WorkerEvent::Progress(_))));
        match events.last() {
            Some(WorkerEvent::Finished(report)) => {
                assert_eq!(report.files, vec![fout.clone()]);
                assert_eq!(report.series, 1);
            }
            other => panic!("expected finished, got {:?}", other),
        }
        assert!(fout.exists());
        assert!(!worker.is_running());
    }

    #[test]
    fn failed_job_reports_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut worker = PlotWorker::spawn(PlotJob {
            csvin: dir.path().join("missing.csv"),
            fout: dir.path().join("out.png"),
            options: PlotOptions::default(),
        });
        let events = collect(&mut worker);
        match events.last() {
            Some(WorkerEvent::Failed(msg)) => assert!(msg.contains("file not found")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn cancelled_before_start_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let csvin = dir.path().join("emg.csv");
        write_csv_file(&csvin, &SynthConfig { samples: 50, ..Default::default() }).unwrap();
        let fout = dir.path().join("never.svg");
        let cancel = AtomicBool::new(true);
        let (tx, _rx) = unbounded();
        let job = PlotJob {
            csvin,
            fout: fout.clone(),
            options: PlotOptions::default(),
        };
        assert!(matches!(run(&job, &tx, &cancel), Err(EmgError::Cancelled)));
        assert!(!fout.exists());
    }
}
