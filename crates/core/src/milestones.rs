//! Per-content-type progress milestones reported while a job runs.

use crate::content::ContentType;

/// A progress checkpoint: fraction complete plus a display label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Milestone {
    pub progress: f64,
    pub step: &'static str,
}

/// The checkpoints a worker walks through for one content type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Milestones {
    /// Reported after the job is picked up, before any provider work.
    pub initializing: Milestone,
    /// Reported just before the provider call.
    pub calling_provider: Milestone,
    /// Reported once the provider returned a usable result.
    pub saving_result: Milestone,
    /// Reported on completion.
    pub complete: Milestone,
}

const IMAGE_MILESTONES: Milestones = Milestones {
    initializing: Milestone { progress: 0.3, step: "initializing image generation" },
    calling_provider: Milestone { progress: 0.5, step: "generating image" },
    saving_result: Milestone { progress: 0.9, step: "saving image" },
    complete: Milestone { progress: 1.0, step: "complete" },
};

const VIDEO_MILESTONES: Milestones = Milestones {
    initializing: Milestone { progress: 0.2, step: "preparing video storyboard" },
    calling_provider: Milestone { progress: 0.4, step: "rendering video" },
    saving_result: Milestone { progress: 0.9, step: "saving video" },
    complete: Milestone { progress: 1.0, step: "complete" },
};

/// Milestones for the given content type.
pub fn milestones_for(content_type: ContentType) -> &'static Milestones {
    match content_type {
        ContentType::Image => &IMAGE_MILESTONES,
        ContentType::Video => &VIDEO_MILESTONES,
    }
}

impl Milestones {
    /// All checkpoints in reporting order.
    pub fn in_order(&self) -> [Milestone; 4] {
        [
            self.initializing,
            self.calling_provider,
            self.saving_result,
            self.complete,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::PROGRESS_STARTED;

    #[test]
    fn milestones_strictly_increase_after_start() {
        for ct in [ContentType::Image, ContentType::Video] {
            let mut last = PROGRESS_STARTED;
            for m in milestones_for(ct).in_order() {
                assert!(m.progress > last, "{ct}: {} <= {last}", m.progress);
                last = m.progress;
            }
            assert_eq!(last, 1.0);
        }
    }

    #[test]
    fn image_and_video_labels_differ() {
        let image = milestones_for(ContentType::Image);
        let video = milestones_for(ContentType::Video);
        assert_ne!(image.calling_provider.step, video.calling_provider.step);
        assert_eq!(image.calling_provider.progress, 0.5);
    }
}
