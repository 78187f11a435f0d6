use serde::Serialize;

/// Vote counts keyed by legal action, in legal-action order.
#[derive(Debug, Clone)]
pub struct VoteTally<A> {
    entries: Vec<(A, usize)>,
    discarded: usize,
}

impl<A: PartialEq + Clone> VoteTally<A> {
    /// Every legal action starts at zero votes.
    pub fn new(legal: &[A]) -> Self {
        Self {
            entries: legal.iter().cloned().map(|action| (action, 0)).collect(),
            discarded: 0,
        }
    }

    /// Counts one vote. Returns `false` and drops the vote when `action` is
    /// not one of the legal actions.
    pub fn vote(&mut self, action: &A) -> bool {
        match self.entries.iter_mut().find(|(candidate, _)| candidate == action) {
            Some((_, votes)) => {
                *votes += 1;
                true
            }
            None => {
                self.discarded += 1;
                false
            }
        }
    }

    pub fn votes(&self, action: &A) -> usize {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == action)
            .map_or(0, |(_, votes)| *votes)
    }

    /// Index and vote count of the most-voted action. The earliest entry
    /// wins ties, so a tally without votes leads with the first legal action.
    pub fn leader(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (index, (_, votes)) in self.entries.iter().enumerate() {
            if best.is_none_or(|(_, top)| *votes > top) {
                best = Some((index, *votes));
            }
        }
        best
    }

    pub fn winner(&self) -> Option<(&A, usize)> {
        self.leader()
            .map(|(index, votes)| (&self.entries[index].0, votes))
    }

    pub fn counts(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, votes)| *votes).collect()
    }

    pub fn total_votes(&self) -> usize {
        self.entries.iter().map(|(_, votes)| votes).sum()
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

/// What happened during one decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionStats {
    pub legal_actions: usize,
    pub samples: usize,
    pub votes_cast: usize,
    pub discarded_votes: usize,
    /// Sampled worlds kept from the oracle because a hidden card could not
    /// be rewritten. They count towards `samples` but cast no vote.
    pub withheld_worlds: usize,
    /// Opponent hand slots left empty, summed over all samples.
    pub shortfall: usize,
    pub winning_index: usize,
    pub winning_votes: usize,
    /// Votes per legal action, in legal-action order.
    pub tally: Vec<usize>,
    pub unseen_cards: u32,
    pub parallel: bool,
}

impl DecisionStats {
    /// The single-action fast path: no sampling, no oracle calls.
    pub fn forced() -> Self {
        Self {
            legal_actions: 1,
            tally: vec![0],
            ..Self::default()
        }
    }

    pub fn was_forced(&self) -> bool {
        self.legal_actions == 1 && self.samples == 0
    }
}
