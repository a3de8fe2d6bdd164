use crate::show::TrackKind;

/// In-flight regenerations, one flag per track.
///
/// Transport is only allowed while no flag is set: a half-replaced ensemble
/// has no single current time.
#[derive(Debug, Default, Clone)]
pub struct RegenerationGate {
    in_flight: [bool; 3],
}

impl RegenerationGate {
    /// Mark `kind` as regenerating. Returns false if it already was.
    pub fn begin(&mut self, kind: TrackKind) -> bool {
        let flag = &mut self.in_flight[kind.index()];
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    /// Clear `kind`. Returns false if it was not regenerating.
    pub fn complete(&mut self, kind: TrackKind) -> bool {
        std::mem::replace(&mut self.in_flight[kind.index()], false)
    }

    pub fn is_regenerating(&self, kind: TrackKind) -> bool {
        self.in_flight[kind.index()]
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.iter().any(|&f| f)
    }

    /// The first regenerating track in `TrackKind::ALL` order.
    pub fn first_busy(&self) -> Option<TrackKind> {
        TrackKind::ALL
            .into_iter()
            .find(|&k| self.is_regenerating(k))
    }
}
