//! Runs one backend end to end and hands the image to persistence.

use std::time::Instant;

use crate::backend::JuliaBackend;
use crate::error::JuliaError;
use crate::models::{ExecutionStats, GenerationParameters, PixelBuffer};

/// Persistence collaborator: receives the finished buffer and a tag.
pub trait ImageSink {
    fn persist(&self, buffer: &PixelBuffer, size: u32, tag: &str) -> Result<(), String>;
}

/// Coarse checkpoints reported by [`GenerationDriver::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Started { backend: String, size: u32 },
    Computed { stats: ExecutionStats },
    Persisted { tag: String },
}

/// Result of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub buffer: PixelBuffer,
    pub stats: ExecutionStats,
    pub tag: String,
}

/// `JuliaSet C=(re,im) size=N mIterations=M made by <backend>`.
pub fn default_tag(params: &GenerationParameters, backend: &str) -> String {
    let c = params.c();
    format!(
        "JuliaSet C=({},{}) size={} mIterations={} made by {}",
        c.re,
        c.im,
        params.size(),
        params.max_iterations(),
        backend
    )
}

/// Times a backend call and forwards the result to an optional sink.
#[derive(Default)]
pub struct GenerationDriver<'a> {
    sink: Option<&'a dyn ImageSink>,
    progress: Option<Box<dyn Fn(Progress) + 'a>>,
}

impl<'a> GenerationDriver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: &'a dyn ImageSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(Progress) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    fn report(&self, event: Progress) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    /// Render `params` on `backend` into a fresh black buffer.
    ///
    /// Wall time covers the backend call only. When `tag` is `None` the
    /// [`default_tag`] is used. A sink failure is returned as
    /// [`JuliaError::Persistence`] after the image was computed.
    pub fn run(
        &self,
        backend: &dyn JuliaBackend,
        params: &GenerationParameters,
        tag: Option<&str>,
    ) -> Result<GenerationOutcome, JuliaError> {
        let name = backend.name();
        self.report(Progress::Started {
            backend: name.clone(),
            size: params.size(),
        });

        let mut buffer = PixelBuffer::new(params.size());
        let start = Instant::now();
        let backend_stats = backend.compute(&mut buffer, params)?;
        let stats = ExecutionStats {
            wall_time: start.elapsed(),
            kernel_time: backend_stats.kernel_time,
        };
        log::debug!("{} rendered {}x{} in {}", name, params.size(), params.size(), stats);
        self.report(Progress::Computed { stats });

        let tag = tag.map_or_else(|| default_tag(params, &name), str::to_string);
        if let Some(sink) = self.sink {
            sink.persist(&buffer, params.size(), &tag)
                .map_err(JuliaError::Persistence)?;
            self.report(Progress::Persisted { tag: tag.clone() });
        }

        Ok(GenerationOutcome { buffer, stats, tag })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use num_complex::Complex32;

    use super::*;
    use crate::backend::SequentialBackend;
    use crate::models::Color;
    use crate::palette::ColorPalette;

    fn params(size: u32, max_iterations: u32) -> GenerationParameters {
        let palette = ColorPalette::from_rgb(&[[0, 0, 100], [0, 0, 130]]).unwrap();
        GenerationParameters::new(
            Complex32::new(-0.805, 0.156),
            1.7,
            max_iterations,
            size,
            palette,
        )
        .unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: RefCell<Vec<(u32, String, usize)>>,
        fail: bool,
    }

    impl ImageSink for RecordingSink {
        fn persist(&self, buffer: &PixelBuffer, size: u32, tag: &str) -> Result<(), String> {
            if self.fail {
                return Err("disk full".to_string());
            }
            self.calls
                .borrow_mut()
                .push((size, tag.to_string(), buffer.len()));
            Ok(())
        }
    }

    /// Reports a fixed kernel time and a bogus wall time.
    struct FixedStatsBackend;

    impl JuliaBackend for FixedStatsBackend {
        fn name(&self) -> String {
            "fixed".to_string()
        }

        fn compute(
            &self,
            _buffer: &mut PixelBuffer,
            _params: &GenerationParameters,
        ) -> Result<ExecutionStats, JuliaError> {
            Ok(ExecutionStats {
                wall_time: Duration::from_secs(3600),
                kernel_time: Some(Duration::from_millis(5)),
            })
        }
    }

    #[test]
    fn test_default_tag_format() {
        let tag = default_tag(&params(800, 300), "sequential");
        assert_eq!(
            tag,
            "JuliaSet C=(-0.805,0.156) size=800 mIterations=300 made by sequential"
        );
    }

    #[test]
    fn test_run_forwards_to_sink() {
        let sink = RecordingSink::default();
        let driver = GenerationDriver::new().with_sink(&sink);
        let outcome = driver
            .run(&SequentialBackend::new(), &params(1, 50), None)
            .unwrap();

        assert_eq!(outcome.buffer.pixels(), &[Color::new(0, 0, 100)]);
        assert_eq!(outcome.stats.kernel_time, None);
        let calls = sink.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 1);
        assert_eq!(calls[0].1, outcome.tag);
        assert!(outcome.tag.ends_with("made by sequential"));
    }

    #[test]
    fn test_explicit_tag_wins() {
        let outcome = GenerationDriver::new()
            .run(&SequentialBackend::new(), &params(2, 5), Some("custom"))
            .unwrap();
        assert_eq!(outcome.tag, "custom");
    }

    #[test]
    fn test_driver_owns_wall_time() {
        let outcome = GenerationDriver::new()
            .run(&FixedStatsBackend, &params(4, 5), None)
            .unwrap();
        assert!(outcome.stats.wall_time < Duration::from_secs(3600));
        assert_eq!(outcome.stats.kernel_time, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_sink_failure_is_persistence_error() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let err = GenerationDriver::new()
            .with_sink(&sink)
            .run(&SequentialBackend::new(), &params(2, 5), None)
            .unwrap_err();
        assert_eq!(err, JuliaError::Persistence("disk full".to_string()));
    }

    #[test]
    fn test_progress_checkpoints() {
        let events = RefCell::new(Vec::new());
        let sink = RecordingSink::default();
        GenerationDriver::new()
            .with_sink(&sink)
            .on_progress(|p| events.borrow_mut().push(p))
            .run(&SequentialBackend::new(), &params(3, 5), Some("t"))
            .unwrap();

        let events = events.into_inner();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Progress::Started {
                backend: "sequential".to_string(),
                size: 3
            }
        );
        assert!(matches!(events[1], Progress::Computed { .. }));
        assert_eq!(events[2], Progress::Persisted { tag: "t".to_string() });
    }

    #[test]
    fn test_backend_error_skips_sink() {
        struct Broken;
        impl JuliaBackend for Broken {
            fn name(&self) -> String {
                "broken".to_string()
            }
            fn compute(
                &self,
                _buffer: &mut PixelBuffer,
                _params: &GenerationParameters,
            ) -> Result<ExecutionStats, JuliaError> {
                Err(JuliaError::ThreadPool("gone".to_string()))
            }
        }

        let sink = RecordingSink::default();
        let result = GenerationDriver::new()
            .with_sink(&sink)
            .run(&Broken, &params(2, 5), None);
        assert!(result.is_err());
        assert!(sink.calls.borrow().is_empty());
    }
}
