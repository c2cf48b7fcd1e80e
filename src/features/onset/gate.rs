//! Two-state hysteresis gate over frame energies
//!
//! The gate is INACTIVE until a frame reaches the threshold. While ACTIVE it
//! counts consecutive frames below the threshold; once that count reaches
//! the minimum silence the candidate note is closed and either committed
//! (long enough) or discarded as a transient. Transitions are pure
//! functions so each one can be exercised without building an envelope.

/// Gate parameters, all expressed in frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateParams {
    /// Energy a frame must reach (inclusive) to count as sounding
    pub threshold: f32,
    /// Consecutive quiet frames that close a note
    pub min_silence_frames: usize,
    /// Shortest sounding span kept as a note
    pub min_note_frames: usize,
}

/// Gate state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateState {
    /// No note in progress
    #[default]
    Inactive,
    /// A candidate note started at frame `start`
    Active {
        /// Frame index of the candidate onset
        start: usize,
        /// Consecutive frames below threshold so far
        silent_frames: usize,
    },
}

/// Outcome of closing a candidate note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// Note kept; carries its onset frame
    Commit(usize),
    /// Candidate too short; carries its onset frame
    Discard(usize),
}

impl GateState {
    /// Advance the gate by one frame
    ///
    /// # Arguments
    ///
    /// * `frame` - Index of the frame being consumed
    /// * `energy` - Smoothed energy of that frame
    /// * `params` - Gate parameters
    ///
    /// # Returns
    ///
    /// The next state and, when a candidate closes on this frame, its event
    pub fn step(self, frame: usize, energy: f32, params: &GateParams) -> (GateState, Option<GateEvent>) {
        let loud = energy >= params.threshold;

        match self {
            GateState::Inactive if loud => (
                GateState::Active {
                    start: frame,
                    silent_frames: 0,
                },
                None,
            ),
            GateState::Inactive => (GateState::Inactive, None),
            GateState::Active { start, .. } if loud => (
                GateState::Active {
                    start,
                    silent_frames: 0,
                },
                None,
            ),
            GateState::Active {
                start,
                silent_frames,
            } => {
                let silent_frames = silent_frames + 1;
                if silent_frames < params.min_silence_frames {
                    return (
                        GateState::Active {
                            start,
                            silent_frames,
                        },
                        None,
                    );
                }
                // sounding span runs from start to the last loud frame
                let span = (frame + 1).saturating_sub(silent_frames).saturating_sub(start);
                (GateState::Inactive, Some(close(start, span, params)))
            }
        }
    }

    /// Close a note still sounding when the envelope ends
    ///
    /// `frame_count` is the number of frames consumed.
    pub fn finish(self, frame_count: usize, params: &GateParams) -> Option<GateEvent> {
        match self {
            GateState::Inactive => None,
            GateState::Active {
                start,
                silent_frames,
            } => {
                let span = frame_count.saturating_sub(silent_frames).saturating_sub(start);
                Some(close(start, span, params))
            }
        }
    }
}

fn close(start: usize, span: usize, params: &GateParams) -> GateEvent {
    if span >= params.min_note_frames {
        GateEvent::Commit(start)
    } else {
        GateEvent::Discard(start)
    }
}

/// Run the gate over a whole envelope and return committed onset frames
pub fn run_gate(envelope: &[f32], params: &GateParams) -> Vec<usize> {
    let mut state = GateState::Inactive;
    let mut onsets = Vec::new();
    let mut discarded = 0usize;

    for (frame, &energy) in envelope.iter().enumerate() {
        let (next, event) = state.step(frame, energy, params);
        state = next;
        match event {
            Some(GateEvent::Commit(start)) => onsets.push(start),
            Some(GateEvent::Discard(_)) => discarded += 1,
            None => {}
        }
    }

    match state.finish(envelope.len(), params) {
        Some(GateEvent::Commit(start)) => onsets.push(start),
        Some(GateEvent::Discard(_)) => discarded += 1,
        None => {}
    }

    if discarded > 0 {
        log::debug!("Note gate discarded {} transient candidates", discarded);
    }

    onsets
}
