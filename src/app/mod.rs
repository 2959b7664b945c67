pub(crate) mod capture;
pub(crate) mod classify;
pub(crate) mod error;
pub(crate) mod executor;
pub(crate) mod model;

use crate::app::capture::Capture;
use crate::app::error::AppError;
use crate::app::executor::{Queue, Worker};
use crate::app::model::{Test, TestHandle};
use crate::configuration::settings::Settings;
use crate::connection::Execute;
use crate::view::event::{Command, Message};
use crate::view::{render, View};
use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub struct App<E> {
    tests: Vec<TestHandle>,
    worker: Worker<E>,
    redraw_interval: Duration,
    messages: mpsc::UnboundedSender<Message>,
    inbox: mpsc::UnboundedReceiver<Message>,
    shutdown: Arc<watch::Sender<bool>>,
    stopped: watch::Receiver<bool>,
}

/// Stops the app from outside the view task, e.g. from a signal handler.
#[derive(Debug, Clone)]
pub struct Interrupt {
    messages: mpsc::UnboundedSender<Message>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Interrupt {
    /// Closes the session, abandoning queued tests, and asks the view to quit.
    pub fn trigger(&self) {
        let _ = self.shutdown.send(true);
        let _ = self.messages.send(Message::Quit);
    }
}

impl<E: Execute + 'static> App<E> {
    pub fn new(tests: Vec<Test>, executor: E, capture: Capture, settings: &Settings) -> Self {
        let (messages, inbox) = mpsc::unbounded_channel();
        let (shutdown, stopped) = watch::channel(false);
        App {
            tests: tests.into_iter().map(Test::into_handle).collect(),
            worker: Worker::new(executor, capture, settings.timeout),
            redraw_interval: settings.redraw_interval,
            messages,
            inbox,
            shutdown: Arc::new(shutdown),
            stopped,
        }
    }

    pub fn interrupt(&self) -> Interrupt {
        Interrupt {
            messages: self.messages.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    pub async fn run(self) -> Result<(), AppError> {
        info!("Starting with {} tests", self.tests.len());
        let (queue, pending) = Queue::new();
        let worker = tokio::spawn(self.worker.run(pending, self.messages.clone(), self.stopped));
        let view = View::new(self.tests, self.redraw_interval);

        let result = match Screen::enter() {
            Ok(mut screen) => {
                event_loop(&mut screen.terminal, view, queue, self.messages, self.inbox).await
            }
            Err(e) => Err(e.into()),
        };

        let _ = self.shutdown.send(true);
        if let Err(e) = worker.await {
            error!("Worker task failed: {}", e);
        }
        result
    }
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut view: View,
    queue: Queue,
    messages: mpsc::UnboundedSender<Message>,
    mut inbox: mpsc::UnboundedReceiver<Message>,
) -> Result<(), AppError> {
    let mut events = EventStream::new();
    let size = terminal.size()?;
    view.update(Message::Resize(size.width, size.height));

    loop {
        if view.take_redraw() {
            terminal.draw(|frame| render::draw(frame, &mut view))?;
        }
        let message = tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => match Message::from_event(event) {
                    Some(message) => message,
                    None => continue,
                },
                Some(Err(e)) => return Err(e.into()),
                None => Message::Quit,
            },
            Some(message) = inbox.recv() => message,
        };

        if !dispatch(view.update(message), &queue, &messages).await {
            return Ok(());
        }
    }
}

/// Carries out a command from the view. Returns `false` once the loop should stop.
async fn dispatch(
    command: Command,
    queue: &Queue,
    messages: &mpsc::UnboundedSender<Message>,
) -> bool {
    match command {
        Command::None => {}
        Command::Quit => {
            info!("Quit requested");
            return false;
        }
        Command::Run(handle) => match queue.submit(handle).await {
            Ok(true) => {
                let _ = messages.send(Message::TestUpdated);
            }
            Ok(false) => {}
            Err(e) => {
                // Only a shutdown closes the queue.
                warn!("{}, quitting", e);
                return false;
            }
        },
        Command::RunAll(handles) => {
            debug!("Queueing {} tests", handles.len());
            let queue = queue.clone();
            let notify = messages.clone();
            tokio::spawn(async move {
                if let Err(e) = queue.submit_all(handles, notify).await {
                    debug!("Rerun all stopped: {}", e);
                }
            });
        }
        Command::Tick(after) => {
            let notify = messages.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = notify.send(Message::Tick);
            });
        }
    }
    true
}

/// Raw mode and the alternate screen for as long as the value lives.
struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Screen {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            error!("Cannot leave raw mode: {}", e);
        }
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            error!("Cannot leave alternate screen: {}", e);
        }
        let _ = self.terminal.show_cursor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::model::Status;
    use tokio::time::timeout;

    fn handle(suite: &str, name: &str) -> TestHandle {
        Test::new(suite, name).into_handle()
    }

    fn identity(handle: Option<TestHandle>) -> Option<String> {
        handle.map(|handle| lock!(handle).to_string())
    }

    #[tokio::test]
    async fn test_rerun_notifies_view_after_submit() {
        let (queue, mut pending) = Queue::new();
        let (messages, mut inbox) = mpsc::unbounded_channel();
        let test = handle("DemoSuite", "MyTest");

        assert!(dispatch(Command::Run(test.clone()), &queue, &messages).await);

        assert_eq!(lock!(test).status, Status::Running);
        assert_eq!(inbox.recv().await, Some(Message::TestUpdated));
        assert_eq!(identity(pending.recv().await), Some("DemoSuite.MyTest".to_owned()));
    }

    #[tokio::test]
    async fn test_rerun_of_running_test_stays_quiet() {
        let (queue, _pending) = Queue::new();
        let (messages, mut inbox) = mpsc::unbounded_channel();
        let test = handle("DemoSuite", "MyTest");
        lock!(test).status = Status::Running;

        assert!(dispatch(Command::Run(test), &queue, &messages).await);

        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rerun_all_leaves_loop_free_while_worker_is_busy() {
        let (queue, mut pending) = Queue::new();
        let (messages, mut inbox) = mpsc::unbounded_channel();
        // The single slot is taken and nobody is reading yet.
        queue.submit(handle("DemoSuite", "Busy")).await.unwrap();
        let rest = vec![handle("DemoSuite", "First"), handle("DemoSuite", "Second")];

        let dispatched = timeout(
            Duration::from_secs(1),
            dispatch(Command::RunAll(rest), &queue, &messages),
        )
        .await;
        assert_eq!(dispatched, Ok(true));

        assert!(dispatch(Command::Tick(Duration::from_millis(5)), &queue, &messages).await);
        assert_eq!(inbox.recv().await, Some(Message::Tick));

        assert_eq!(identity(pending.recv().await), Some("DemoSuite.Busy".to_owned()));
        assert_eq!(identity(pending.recv().await), Some("DemoSuite.First".to_owned()));
        assert_eq!(identity(pending.recv().await), Some("DemoSuite.Second".to_owned()));
        assert_eq!(inbox.recv().await, Some(Message::TestUpdated));
        assert_eq!(inbox.recv().await, Some(Message::TestUpdated));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_arrives_after_interval() {
        let (queue, _pending) = Queue::new();
        let (messages, mut inbox) = mpsc::unbounded_channel();

        assert!(dispatch(Command::Tick(Duration::from_millis(200)), &queue, &messages).await);

        assert!(inbox.try_recv().is_err());
        tokio::time::sleep(Duration::from_millis(199)).await;
        assert!(inbox.try_recv().is_err());
        assert_eq!(inbox.recv().await, Some(Message::Tick));
    }

    #[tokio::test]
    async fn test_closed_queue_stops_loop() {
        let (queue, pending) = Queue::new();
        let (messages, mut inbox) = mpsc::unbounded_channel();
        drop(pending);

        assert!(!dispatch(Command::Run(handle("DemoSuite", "MyTest")), &queue, &messages).await);
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_quit_stops_loop_and_none_does_not() {
        let (queue, _pending) = Queue::new();
        let (messages, _inbox) = mpsc::unbounded_channel();

        assert!(!dispatch(Command::Quit, &queue, &messages).await);
        assert!(dispatch(Command::None, &queue, &messages).await);
    }
}
