//! # Freshet
//!
//! A client-side feed-synchronization engine over a simulated remote
//! source.
//!
//! ## Architecture
//!
//! Freshet follows a modular pipeline architecture:
//!
//! ```text
//! FetchSource → PageCache/RefreshCache → SyncController → FeedSnapshot
//!                                  ExposureTracker → ExposureLog
//! ```
//!
//! - [`fetcher`]: the [`FetchSource`](fetcher::FetchSource) boundary and
//!   its deterministic simulator
//! - [`cache`]: last-successful page results and the single-slot refresh
//!   fallback, with retry bookkeeping
//! - [`controller`]: the actor owning the feed list, flags and caches
//! - [`exposure`]: debounced viewport-exposure tracking
//!
//! ## Quick Start
//!
//! ```bash
//! # Load three pages and print the feed
//! freshet run
//!
//! # Load, then prepend a refresh batch
//! freshet run --refresh
//!
//! # Sweep a viewport across the feed and print exposure analytics
//! freshet track
//! ```
//!
//! ## Modules
//!
//! - [`app`]: application context and error types
//! - [`cli`]: command-line interface definitions
//! - [`config`]: TOML configuration
//! - [`domain`]: core domain models (FeedItem, exposure types, snapshots)
//! - [`fetcher`]: page/refresh fetching boundary
//! - [`cache`]: page and refresh caches
//! - [`controller`]: load/refresh/retry orchestration
//! - [`exposure`]: viewport exposure tracking
//! - [`prefetch`]: fire-and-forget image prefetch
//! - [`render`]: card-type to renderer lookup

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// fetch source, prefetcher, controller, exposure tracker.
pub mod app;

/// Page and refresh caches with per-page retry bookkeeping.
///
/// - [`PageCache`](cache::PageCache): last successful result per page
/// - [`RefreshCache`](cache::RefreshCache): single-slot refresh fallback
pub mod cache;

/// Command-line interface using clap.
///
/// - `run [--pages N] [--refresh] [--json]` - Synchronize and print the feed
/// - `track [--pages N]` - Simulate scrolling and print exposure logs
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/freshet/config.toml`: source pacing (page size,
/// latency, total pages) and tracker debounce.
pub mod config;

/// Core domain models.
///
/// - [`FeedItem`](domain::FeedItem): immutable feed entries
/// - [`ExposureEvent`](domain::ExposureEvent) / [`ExposureRecord`](domain::ExposureRecord):
///   visibility transitions
/// - [`FeedSnapshot`](domain::FeedSnapshot): the observable engine state
pub mod domain;

/// Load/refresh/retry orchestration.
///
/// - [`SyncController`](controller::SyncController): single-writer actor
///   owning the feed list, caches and flags
/// - [`SyncHandle`](controller::SyncHandle): cloneable command/observe handle
pub mod controller;

/// Viewport exposure tracking.
///
/// - [`ExposureTracker`](exposure::ExposureTracker): pure snapshot differ
/// - [`spawn_exposure_tracker`](exposure::spawn_exposure_tracker): debounced
///   background wrapper
pub mod exposure;

/// Feed fetching boundary.
///
/// - [`FetchSource`](fetcher::FetchSource): async trait for page/refresh fetching
/// - [`SimulatedSource`](fetcher::SimulatedSource): deterministic simulator with
///   injected failures
pub mod fetcher;

/// Fire-and-forget image prefetching.
///
/// Best-effort URL warming; failures are swallowed and never affect
/// loading state.
pub mod prefetch;

/// Renderer resolution.
///
/// Maps a [`CardType`](domain::CardType) to an externally registered
/// [`RendererHandle`](render::RendererHandle); the engine itself never renders.
pub mod render;
