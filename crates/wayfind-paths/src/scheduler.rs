//! Frame-budgeted path request queue.
//!
//! Hosts submit requests at any time and call [`PathScheduler::tick`] once
//! per frame. Each tick services at most `max_requests_per_frame` requests
//! in submission order, and every one of those searches is capped at
//! `max_nodes_per_frame` expansions. The worst-case cost of a tick is
//! therefore bounded no matter how many requests are waiting.
//!
//! Everything here is single-threaded: graphs and heuristics are shared
//! through `Rc`, and completion is signalled by callbacks or by
//! [`PendingPath`], a future that resolves on a later tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use log::{debug, trace};
use wayfind_core::Point;

use crate::astar::{AStar, SearchOutcome};
use crate::error::{PathError, Result};
use crate::grid::GridGraph;
use crate::heuristic::{Heuristic, Manhattan, Octile};
use crate::modifier::EdgeModifier;
use crate::traits::{Edge, Graph, Node};

/// Per-tick budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Requests serviced per tick.
    pub max_requests_per_frame: usize,
    /// Expansion cap applied to each individual search.
    pub max_nodes_per_frame: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_requests_per_frame: 4,
            max_nodes_per_frame: 2048,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_requests_per_frame == 0 {
            return Err(PathError::InvalidConfig("max_requests_per_frame must be at least 1"));
        }
        if self.max_nodes_per_frame == 0 {
            return Err(PathError::InvalidConfig("max_nodes_per_frame must be at least 1"));
        }
        Ok(())
    }
}

/// Identifies a submitted request. Ids increase in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notification sent to observers after a request's callback has run.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCompleted<N> {
    pub id: RequestId,
    pub start: N,
    pub goal: N,
    pub path: Option<Vec<N>>,
    pub outcome: SearchOutcome,
}

type Callback<N> = Box<dyn FnOnce(Option<Vec<N>>)>;
type Observer<N> = Box<dyn FnMut(&PathCompleted<N>)>;

struct Request<N> {
    id: RequestId,
    start: N,
    goal: N,
    graph: Rc<dyn Graph<N>>,
    heuristic: Rc<dyn Heuristic<N>>,
    modifier: Option<Rc<dyn EdgeModifier<N>>>,
    callback: Callback<N>,
}

/// FIFO scheduler for path requests.
pub struct PathScheduler<N: Node> {
    config: SchedulerConfig,
    astar: AStar<N>,
    queue: VecDeque<Request<N>>,
    observers: Vec<Observer<N>>,
    next_id: u64,
    serviced: u64,
}

impl<N: Node> fmt::Debug for PathScheduler<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathScheduler")
            .field("config", &self.config)
            .field("pending", &self.queue.len())
            .field("observers", &self.observers.len())
            .field("serviced", &self.serviced)
            .finish()
    }
}

impl<N: Node + 'static> Default for PathScheduler<N> {
    fn default() -> Self {
        Self::with_valid_config(SchedulerConfig::default())
    }
}

impl<N: Node + 'static> PathScheduler<N> {
    /// Create a scheduler, rejecting zero budgets.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            astar: AStar::new().with_max_expand(config.max_nodes_per_frame),
            queue: VecDeque::new(),
            observers: Vec::new(),
            next_id: 0,
            serviced: 0,
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Number of requests still waiting.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Total requests serviced since creation.
    pub fn serviced(&self) -> u64 {
        self.serviced
    }

    /// Register an observer called for every completed request, after the
    /// request's own callback.
    pub fn subscribe(&mut self, observer: impl FnMut(&PathCompleted<N>) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Queue a search. `callback` runs during a later [`tick`](Self::tick)
    /// with the path, or `None` if there is none or the budget ran out.
    pub fn submit(
        &mut self,
        start: N,
        goal: N,
        graph: Rc<dyn Graph<N>>,
        heuristic: Rc<dyn Heuristic<N>>,
        modifier: Option<Rc<dyn EdgeModifier<N>>>,
        callback: impl FnOnce(Option<Vec<N>>) + 'static,
    ) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.queue.push_back(Request {
            id,
            start,
            goal,
            graph,
            heuristic,
            modifier,
            callback: Box::new(callback),
        });
        id
    }

    /// Queue a search and get a handle that resolves once it has run.
    pub fn submit_pending(
        &mut self,
        start: N,
        goal: N,
        graph: Rc<dyn Graph<N>>,
        heuristic: Rc<dyn Heuristic<N>>,
        modifier: Option<Rc<dyn EdgeModifier<N>>>,
    ) -> PendingPath<N> {
        let slot = Rc::new(RefCell::new(Slot::default()));
        let filler = Rc::clone(&slot);
        let id = self.submit(start, goal, graph, heuristic, modifier, move |path| {
            let waker = {
                let mut slot = filler.borrow_mut();
                slot.result = Some(path);
                slot.waker.take()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        });
        PendingPath { id, slot }
    }

    /// Service up to `max_requests_per_frame` queued requests, oldest
    /// first. Returns how many ran.
    pub fn tick(&mut self) -> usize {
        let mut done = 0;
        while done < self.config.max_requests_per_frame {
            let Some(req) = self.queue.pop_front() else {
                break;
            };
            let Request {
                id,
                start,
                goal,
                graph,
                heuristic,
                modifier,
                callback,
            } = req;

            let path = match &modifier {
                Some(m) => self.astar.find_path_with(
                    &*graph,
                    &*heuristic,
                    &**m,
                    start.clone(),
                    goal.clone(),
                ),
                None => self
                    .astar
                    .find_path(&*graph, &*heuristic, start.clone(), goal.clone()),
            };
            let outcome = self.astar.last_outcome();
            trace!(
                "request {id}: {outcome:?} after {} expansions",
                self.astar.last_expanded()
            );

            let event = (!self.observers.is_empty()).then(|| PathCompleted {
                id,
                start,
                goal,
                path: path.clone(),
                outcome,
            });
            callback(path);
            if let Some(event) = event {
                for observer in &mut self.observers {
                    observer(&event);
                }
            }
            done += 1;
        }

        if done > 0 {
            self.serviced += done as u64;
            debug!(
                "path scheduler tick: {done} serviced, {} pending",
                self.queue.len()
            );
        }
        done
    }
}

impl PathScheduler<Point> {
    /// Queue a search on a raw grid, choosing connectivity per request.
    /// Uses the octile heuristic with diagonals and Manhattan without.
    ///
    /// Queued requests keep their own `Rc` to `grid`, so the grid cannot be
    /// edited in place while any are pending. To change terrain, build the
    /// edited grid (for example with [`Rc::unwrap_or_clone`]), submit later
    /// requests against the new `Rc`, and call
    /// [`PathCache::invalidate`](crate::PathCache::invalidate) on any cache
    /// holding paths from the old one.
    pub fn submit_grid(
        &mut self,
        grid: Rc<GridGraph>,
        start: Point,
        goal: Point,
        allow_diagonals: bool,
        callback: impl FnOnce(Option<Vec<Point>>) + 'static,
    ) -> RequestId {
        let heuristic: Rc<dyn Heuristic<Point>> = if allow_diagonals {
            Rc::new(Octile)
        } else {
            Rc::new(Manhattan)
        };
        let graph = Rc::new(GridConnectivity {
            grid,
            diagonals: allow_diagonals,
        });
        self.submit(start, goal, graph, heuristic, None, callback)
    }
}

/// A shared grid viewed with a fixed connectivity.
struct GridConnectivity {
    grid: Rc<GridGraph>,
    diagonals: bool,
}

impl Graph<Point> for GridConnectivity {
    fn edges(&self, node: &Point, buf: &mut Vec<Edge<Point>>) {
        self.grid.edges_with(*node, self.diagonals, buf)
    }

    fn is_traversable(&self, node: &Point) -> bool {
        self.grid.is_walkable(*node)
    }
}

struct Slot<N> {
    result: Option<Option<Vec<N>>>,
    waker: Option<Waker>,
}

impl<N> Default for Slot<N> {
    fn default() -> Self {
        Self {
            result: None,
            waker: None,
        }
    }
}

/// Handle to a request submitted with
/// [`PathScheduler::submit_pending`].
///
/// Resolves to the search result once a tick has serviced the request.
/// Awaiting it never blocks the thread: the host keeps ticking, and the
/// executor is woken when the result lands.
pub struct PendingPath<N> {
    id: RequestId,
    slot: Rc<RefCell<Slot<N>>>,
}

impl<N> fmt::Debug for PendingPath<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPath")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl<N> PendingPath<N> {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Whether a result is waiting to be taken.
    pub fn is_ready(&self) -> bool {
        self.slot.borrow().result.is_some()
    }

    /// The outer `None` means the request has not run yet; the inner value
    /// is the search result. A result can only be taken once.
    pub fn try_take(&self) -> Option<Option<Vec<N>>> {
        self.slot.borrow_mut().result.take()
    }
}

impl<N> Future for PendingPath<N> {
    type Output = Option<Vec<N>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match slot.result.take() {
            Some(path) => Poll::Ready(path),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
