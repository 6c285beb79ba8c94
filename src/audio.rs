//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects, no asset files.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::settings::Settings;
use crate::sim::{GameEvent, MissKind};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Marker landed in the zone
    Hit,
    /// Hit that raised the combo banner
    ComboHit,
    /// Missed by a hair
    NearMiss,
    /// Clean miss
    Miss,
    /// New best score
    HighScore,
    /// Retry pressed
    Restart,
}

impl SoundEffect {
    /// Sound for a controller event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Hit { .. } => Some(SoundEffect::Hit),
            GameEvent::ComboBanner(_) => Some(SoundEffect::ComboHit),
            GameEvent::NewHighScore(_) => Some(SoundEffect::HighScore),
            GameEvent::Miss { kind, .. } => Some(match kind {
                MissKind::SoClose | MissKind::Almost => SoundEffect::NearMiss,
                MissKind::TooEarly | MissKind::TooLate => SoundEffect::Miss,
            }),
            GameEvent::Restarted => Some(SoundEffect::Restart),
            GameEvent::LedgerSync { .. } => None,
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: settings.effective_volume(),
        }
    }

    /// Pick up volume and mute changes
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.volume = settings.effective_volume();
    }

    /// Play the sounds for a batch of controller events
    ///
    /// Only the loudest cue of a batch plays, so a combo hit does not stack
    /// on top of the plain hit ping.
    pub fn play_events(&self, events: &[GameEvent]) {
        let cue = events
            .iter()
            .filter_map(SoundEffect::for_event)
            .max_by_key(|effect| match effect {
                SoundEffect::HighScore => 3,
                SoundEffect::ComboHit => 2,
                _ => 1,
            });
        if let Some(effect) = cue {
            self.play(effect);
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Hit => self.play_hit(ctx, vol),
            SoundEffect::ComboHit => self.play_combo(ctx, vol),
            SoundEffect::NearMiss => self.play_near_miss(ctx, vol),
            SoundEffect::Miss => self.play_miss(ctx, vol),
            SoundEffect::HighScore => self.play_high_score(ctx, vol),
            SoundEffect::Restart => self.play_restart(ctx, vol),
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Short bright blip with a decaying envelope
    fn blip(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
        level: f32,
        at: f64,
        len: f64,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
            return;
        };
        let envelope = gain.gain();
        envelope.set_value_at_time(level, at).ok();
        envelope.exponential_ramp_to_value_at_time(0.01, at + len).ok();

        osc.start_with_when(at).ok();
        osc.stop_with_when(at + len + 0.02).ok();
    }

    /// Exponential pitch glide `(from, to)` Hz under a decaying envelope
    fn sweep(
        &self,
        ctx: &AudioContext,
        (from, to): (f32, f32),
        osc_type: OscillatorType,
        level: f32,
        at: f64,
        len: f64,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
            return;
        };
        let pitch = osc.frequency();
        pitch.set_value_at_time(from, at).ok();
        pitch.exponential_ramp_to_value_at_time(to, at + len * 0.8).ok();

        let envelope = gain.gain();
        envelope.set_value_at_time(level, at).ok();
        envelope.exponential_ramp_to_value_at_time(0.01, at + len).ok();

        osc.start_with_when(at).ok();
        osc.stop_with_when(at + len + 0.05).ok();
    }

    /// Hit - clean ping
    fn play_hit(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.blip(ctx, 880.0, OscillatorType::Sine, vol * 0.35, t, 0.12);
    }

    /// Combo - rising double ping
    fn play_combo(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.blip(ctx, 880.0, OscillatorType::Sine, vol * 0.3, t, 0.1);
        self.blip(ctx, 1320.0, OscillatorType::Triangle, vol * 0.3, t + 0.07, 0.15);
    }

    /// Near miss - wobbly buzz
    fn play_near_miss(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 330.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        let pitch = osc.frequency();
        for (i, freq) in [330.0, 300.0, 340.0, 280.0].into_iter().enumerate() {
            pitch.set_value_at_time(freq, t + i as f64 * 0.08).ok();
        }

        let envelope = gain.gain();
        envelope.set_value_at_time(vol * 0.35, t).ok();
        envelope.exponential_ramp_to_value_at_time(0.01, t + 0.3).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.35).ok();
    }

    /// Miss - low descending thud
    fn play_miss(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.sweep(ctx, (220.0, 55.0), OscillatorType::Sawtooth, vol * 0.4, t, 0.4);
    }

    /// High score - celebratory arpeggio
    fn play_high_score(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [660.0, 880.0, 1100.0, 1320.0].iter().enumerate() {
            let t = ctx.current_time() + i as f64 * 0.07;
            self.blip(ctx, *freq, OscillatorType::Triangle, vol * 0.25, t, 0.2);
        }
    }

    /// Restart - quick sweep up
    fn play_restart(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();
        self.sweep(ctx, (200.0, 600.0), OscillatorType::Triangle, vol * 0.25, t, 0.2);
    }
}
