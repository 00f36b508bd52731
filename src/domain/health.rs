// Health pool shared by every actor kind.

/// Health clamped to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Full health pool. Non-positive or non-finite maxima become 1.
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        Self { current: max, max }
    }

    /// Applies damage and returns the amount actually removed.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        before - self.current
    }

    pub fn heal(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.current = (self.current + amount).min(self.max);
        }
    }

    /// Changes the maximum while keeping the current health ratio.
    pub fn set_max(&mut self, max: f32) {
        if !max.is_finite() || max <= 0.0 {
            return;
        }
        let ratio = self.fraction();
        self.max = max;
        self.current = (max * ratio).clamp(0.0, max);
    }

    pub fn reset(&mut self) {
        self.current = self.max;
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}
