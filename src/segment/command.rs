use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::io::Write as _;
use std::pin::Pin;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use crate::assets::image_ref::ImageRef;
use crate::foundation::error::{UnderlayError, UnderlayResult};
use crate::segment::Segmenter;

/// Segmenter that delegates to an external program.
///
/// The encoded photo is written to the program's stdin; the program must print an encoded
/// cutout image (PNG with alpha) to stdout and exit successfully. The program runs on a
/// worker thread, so the returned future stays pending without blocking its executor.
#[derive(Clone, Debug)]
pub struct CommandSegmenter {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandSegmenter {
    /// Run `program` with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Start the program on a worker thread; the returned future resolves with its stdout.
    fn spawn_job(&self, input: Vec<u8>) -> UnderlayResult<CommandJob> {
        let shared = Arc::new(Mutex::new(JobSlot::default()));
        let completion = Completion {
            shared: Arc::clone(&shared),
            delivered: false,
        };
        let (program, args) = (self.program.clone(), self.args.clone());
        std::thread::Builder::new()
            .name("underlay-segment".to_owned())
            .spawn(move || {
                let mut completion = completion;
                completion.deliver(run_blocking(&program, &args, &input));
            })
            .map_err(|e| {
                UnderlayError::segmentation(format!("failed to start segmentation worker: {e}"))
            })?;
        Ok(CommandJob { shared })
    }
}

impl Segmenter for CommandSegmenter {
    async fn segment(&self, image: &ImageRef) -> UnderlayResult<ImageRef> {
        let input = image.to_encoded()?;
        tracing::debug!(program = ?self.program, bytes = input.len(), "running segmentation command");
        let out = self.spawn_job(input)?.await?;
        Ok(ImageRef::from_encoded(out))
    }
}

#[derive(Default)]
struct JobSlot {
    result: Option<UnderlayResult<Vec<u8>>>,
    waker: Option<Waker>,
}

fn lock_slot(shared: &Mutex<JobSlot>) -> MutexGuard<'_, JobSlot> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Worker side of a [`CommandJob`]. Always delivers, even if the worker unwinds.
struct Completion {
    shared: Arc<Mutex<JobSlot>>,
    delivered: bool,
}

impl Completion {
    fn deliver(&mut self, result: UnderlayResult<Vec<u8>>) {
        self.delivered = true;
        let waker = {
            let mut slot = lock_slot(&self.shared);
            slot.result = Some(result);
            slot.waker.take()
        };
        if let Some(w) = waker {
            w.wake();
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.delivered {
            self.deliver(Err(UnderlayError::segmentation(
                "segmentation worker exited without a result",
            )));
        }
    }
}

/// Pending output of a segmentation program running on its worker thread.
struct CommandJob {
    shared: Arc<Mutex<JobSlot>>,
}

impl Future for CommandJob {
    type Output = UnderlayResult<Vec<u8>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = lock_slot(&self.shared);
        if let Some(result) = slot.result.take() {
            return Poll::Ready(result);
        }
        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

fn run_blocking(program_os: &OsStr, args: &[OsString], input: &[u8]) -> UnderlayResult<Vec<u8>> {
    let program = program_os.to_string_lossy();
    let mut child = Command::new(program_os)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| UnderlayError::segmentation(format!("failed to spawn '{program}': {e}")))?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
        UnderlayError::segmentation(format!("failed to open '{program}' stdin"))
    })?;

    // stdin is fed from a second thread so a program that streams output early cannot
    // deadlock against a full stdout pipe.
    let (output, written) = std::thread::scope(|s| {
        let writer = s.spawn(move || {
            let res = stdin.write_all(input);
            drop(stdin);
            res
        });
        let output = child.wait_with_output();
        let written = writer.join();
        (output, written)
    });

    let output = output
        .map_err(|e| UnderlayError::segmentation(format!("failed to wait for '{program}': {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UnderlayError::segmentation(format!(
            "'{program}' exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    match written {
        Ok(Ok(())) => {}
        // A program may legitimately stop reading once it has what it needs.
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Ok(Err(e)) => {
            return Err(UnderlayError::segmentation(format!(
                "failed to write image to '{program}': {e}"
            )));
        }
        Err(_) => {
            return Err(UnderlayError::segmentation("stdin writer thread panicked"));
        }
    }
    if output.stdout.is_empty() {
        return Err(UnderlayError::segmentation(format!(
            "'{program}' produced no output"
        )));
    }
    Ok(output.stdout)
}

#[cfg(test)]
#[path = "../../tests/unit/segment/command.rs"]
mod tests;
