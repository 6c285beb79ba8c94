//! One Tap Too Late entry point
//!
//! In the browser this wires the controller to the canvas, DOM HUD, audio,
//! LocalStorage, the points ledger and the injected wallet. Natively it runs
//! a headless autoplay demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use one_tap::audio::AudioManager;
    use one_tap::consts::*;
    use one_tap::persistence::ledger::{fetch_or_default, store_logged};
    use one_tap::persistence::{WebLedger, WebStorage};
    use one_tap::platform::{
        self, InjectedWallet, InstallHint, WalletError, WalletProvider, install_hint,
    };
    use one_tap::renderer::{RenderState, track_scene};
    use one_tap::sim::GameEvent;
    use one_tap::ui::HudView;
    use one_tap::{GameController, Settings};

    /// Widest the track is drawn, in CSS pixels
    const MAX_TRACK_CSS_PX: f64 = 520.0;

    /// Game instance holding all state
    struct Game {
        controller: GameController<WebStorage>,
        render_state: Option<RenderState>,
        audio: AudioManager,
        settings: Settings,
        ledger: Rc<WebLedger>,
        wallet: InjectedWallet,
        /// A connect/disconnect is in flight
        wallet_busy: bool,
        last_time: f64,
        /// Controller clock when the current shake started
        shake_started: Option<f64>,
    }

    impl Game {
        fn new(seed: u64, settings: Settings) -> Self {
            let controller = GameController::new(seed, WebStorage::new(), &settings);
            Self {
                controller,
                render_state: None,
                audio: AudioManager::new(&settings),
                ledger: Rc::new(WebLedger::from_settings(&settings)),
                settings,
                wallet: InjectedWallet,
                wallet_busy: false,
                last_time: 0.0,
                shake_started: None,
            }
        }

        /// Advance the controller by the frame delta
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).clamp(0.0, MAX_FRAME_DELTA_MS)
            } else {
                0.0
            };
            self.last_time = time;

            let events = self.controller.tick(dt);
            self.handle_events(events);
        }

        fn tap(&mut self) {
            let events = self.controller.tap();
            self.handle_events(events);
        }

        fn restart(&mut self) {
            let events = self.controller.restart();
            self.shake_started = None;
            self.handle_events(events);
        }

        /// Sounds, shake timing and ledger writes for controller events
        fn handle_events(&mut self, events: Vec<GameEvent>) {
            if events.is_empty() {
                return;
            }
            self.audio.play_events(&events);

            for event in events {
                match event {
                    GameEvent::Miss { .. } if self.controller.presentation().shake => {
                        self.shake_started = Some(self.controller.now_ms());
                    }
                    GameEvent::LedgerSync { wallet, record } => {
                        let ledger = self.ledger.clone();
                        wasm_bindgen_futures::spawn_local(async move {
                            store_logged(&*ledger, &wallet, &record, platform::unix_time_ms())
                                .await;
                        });
                    }
                    _ => {}
                }
            }
        }

        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            self.audio.apply_settings(&self.settings);
            self.settings.save();
            log::info!("Sound {}", if self.settings.muted { "off" } else { "on" });
        }

        /// Render the current frame
        fn render(&mut self, view: &HudView) {
            let shake_t = self
                .shake_started
                .filter(|_| view.track.shake)
                .map(|start| ((self.controller.now_ms() - start) / SHAKE_MS) as f32);

            if let Some(ref mut render_state) = self.render_state {
                let vertices = track_scene(&view.track, shake_t);
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    /// Copy the HUD projection into the DOM
    fn update_hud(document: &Document, view: &HudView, wallet_linked: bool) {
        set_text(document, "score", &view.score.to_string());
        set_text(document, "best", &view.best.to_string());

        match &view.combo_banner {
            Some(text) => {
                set_text(document, "combo-banner", text);
                set_hidden(document, "combo-banner", false);
            }
            None => set_hidden(document, "combo-banner", true),
        }

        set_hidden(document, "instructions", !view.show_instructions);

        if let Some(el) = document.get_element_by_id("feedback") {
            match view.feedback {
                Some((text, tone)) => {
                    if el.text_content().as_deref() != Some(text) {
                        el.set_text_content(Some(text));
                    }
                    let _ = el.set_attribute("class", tone.css_class());
                }
                None => {
                    let _ = el.set_attribute("class", "feedback hidden");
                }
            }
        }

        set_hidden(document, "game-over", !view.game_over);
        if view.game_over {
            set_text(document, "final-score", &view.score.to_string());
            set_text(
                document,
                "streak-line",
                view.streak_line.as_deref().unwrap_or_default(),
            );
        }

        set_text(
            document,
            "wallet-status",
            view.wallet_status.as_deref().unwrap_or_default(),
        );
        match view.wallet_points {
            Some(points) => set_text(document, "wallet-points", &format!("{} pts", points)),
            None => set_text(document, "wallet-points", ""),
        }
        set_text(
            document,
            "wallet-btn",
            if wallet_linked { "Disconnect" } else { "Connect Wallet" },
        );
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("One Tap Too Late starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        set_hidden(&document, "loading", true);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, settings)));
        log::info!("Game initialized with seed: {}", seed);

        // The HUD keeps working without a GPU, so renderer failures only log
        match init_renderer(&canvas, width, height, (MAX_TRACK_CSS_PX * dpr) as f32).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("Renderer unavailable: {}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_restart_button(game.clone());
        setup_wallet_button(game.clone());
        setup_resize(canvas.clone(), game.clone());

        if game.borrow().settings.auto_reconnect_wallet {
            // Holds off the wallet button until the silent attempt settles
            game.borrow_mut().wallet_busy = true;
            let game = game.clone();
            wasm_bindgen_futures::spawn_local(async move {
                connect_wallet(&game, true).await;
                game.borrow_mut().wallet_busy = false;
            });
        }

        request_animation_frame(game);

        log::info!("One Tap Too Late running!");
        Ok(())
    }

    async fn init_renderer(
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
        max_track_px: f32,
    ) -> Result<RenderState, String> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| e.to_string())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| e.to_string())?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        RenderState::new(surface, &adapter, width, height, max_track_px)
            .await
            .map_err(|e| e.to_string())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().tap();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch; prevent the synthesized mouse event from tapping twice
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().tap();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" => {
                        event.prevent_default();
                        if g.controller.session().is_playing() {
                            g.tap();
                        } else {
                            g.restart();
                        }
                    }
                    "a" | "A" => {
                        let enabled = !g.controller.autoplay();
                        g.controller.set_autoplay(enabled);
                        log::info!("Autoplay: {}", enabled);
                    }
                    "m" | "M" => g.toggle_mute(),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };

        if let Some(btn) = document.get_element_by_id("retry-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.stop_propagation();
                game.borrow_mut().restart();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_wallet_button(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };

        if let Some(btn) = document.get_element_by_id("wallet-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.stop_propagation();
                let (linked, busy) = {
                    let g = game.borrow();
                    (g.controller.wallet().is_some(), g.wallet_busy)
                };
                if busy {
                    return;
                }
                game.borrow_mut().wallet_busy = true;

                let game = game.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if linked {
                        disconnect_wallet(&game).await;
                    } else {
                        connect_wallet(&game, false).await;
                    }
                    game.borrow_mut().wallet_busy = false;
                });
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else { return };
            let dpr = window.device_pixel_ratio();
            let width = (canvas.client_width() as f64 * dpr) as u32;
            let height = (canvas.client_height() as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(ref mut render_state) = game.borrow_mut().render_state {
                render_state.resize(width, height);
                render_state.set_max_track_px((MAX_TRACK_CSS_PX * dpr) as f32);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Connect the injected wallet and load its ledger record
    ///
    /// A silent (`trusted_only`) attempt that fails leaves the HUD alone.
    async fn connect_wallet(game: &Rc<RefCell<Game>>, trusted_only: bool) {
        let (wallet, ledger) = {
            let g = game.borrow();
            (g.wallet, g.ledger.clone())
        };

        let result = if trusted_only {
            wallet.connect_trusted().await
        } else {
            wallet.connect().await
        };

        match result {
            Ok(address) => {
                let record = fetch_or_default(&*ledger, address.as_str()).await;
                let mut g = game.borrow_mut();
                let events = g.controller.attach_wallet(address, Some(record));
                g.handle_events(events);
            }
            Err(e) if trusted_only => log::info!("No wallet session to restore: {}", e),
            Err(e) => {
                log::warn!("Wallet connect failed: {}", e);
                let mut g = game.borrow_mut();
                g.controller
                    .set_wallet_status(Some(e.status_text().to_string()));
                if e == WalletError::ProviderMissing {
                    offer_install(&g.settings);
                }
            }
        }
    }

    async fn disconnect_wallet(game: &Rc<RefCell<Game>>) {
        let wallet = game.borrow().wallet;
        wallet.disconnect().await;

        let mut g = game.borrow_mut();
        let events = g.controller.detach_wallet();
        g.handle_events(events);
    }

    /// Install link on desktop; reopen in the wallet's browser on mobile
    fn offer_install(settings: &Settings) {
        let hint = install_hint(
            &platform::user_agent(),
            &platform::page_url(),
            &settings.wallet_install_url,
            &settings.wallet_deep_link_prefix,
        );
        log::info!("No wallet provider, offering {}", hint.url());

        match hint {
            InstallHint::DeepLink(url) => {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_href(&url);
                }
            }
            InstallHint::Install(url) => {
                let Some(document) = document() else { return };
                if let Some(link) = document.get_element_by_id("wallet-install") {
                    let _ = link.set_attribute("href", &url);
                    let _ = link.class_list().toggle_with_force("hidden", false);
                }
            }
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);

            let view = HudView::from_controller(&g.controller);
            g.render(&view);
            if let Some(document) = document() {
                update_hud(&document, &view, g.controller.wallet().is_some());
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        web_sys::console::error_1(&e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is wasm_main
}

/// Headless autoplay runs against in-memory stores
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use one_tap::persistence::ledger::{fetch_or_default, store_logged};
    use one_tap::persistence::{MemoryLedger, MemoryStore};
    use one_tap::platform::{self, StubWallet, WalletProvider};
    use one_tap::sim::{GameEvent, ScoringMode, Span, spans_overlap};
    use one_tap::{GameController, Settings};

    pub const DEFAULT_SEED: u64 = 0x07A9_700_1A7E;

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const RUNS: u32 = 3;
    /// Simulated time before autoplay hands over and the run is ended
    const RUN_LIMIT_MS: f64 = 20_000.0;
    const DEMO_WALLET: &str = "DemoWa11etAddress1111111111111111111111111";

    /// Write any ledger syncs the events ask for
    fn sync(ledger: &MemoryLedger, events: Vec<GameEvent>) {
        for event in events {
            if let GameEvent::LedgerSync { wallet, record } = event {
                pollster::block_on(store_logged(
                    ledger,
                    &wallet,
                    &record,
                    platform::unix_time_ms(),
                ));
            }
        }
    }

    fn marker_off_target(controller: &GameController<MemoryStore>) -> bool {
        let session = controller.session();
        !spans_overlap(
            Span::marker(session.marker_position),
            Span::target(session.target_position),
        )
    }

    pub fn run(seed: u64, scoring: Option<ScoringMode>) {
        let mut settings = Settings::load();
        if let Some(scoring) = scoring {
            settings.scoring = scoring;
        }
        let mut controller = GameController::new(seed, MemoryStore::new(), &settings);
        let ledger = MemoryLedger::new();
        let wallet = StubWallet::new(DEMO_WALLET, true);

        match pollster::block_on(wallet.connect_trusted()) {
            Ok(address) => {
                let record = pollster::block_on(fetch_or_default(&ledger, address.as_str()));
                let events = controller.attach_wallet(address, Some(record));
                sync(&ledger, events);
            }
            Err(e) => log::warn!("Demo wallet unavailable: {}", e),
        }

        for run in 1..=RUNS {
            if run > 1 {
                let events = controller.restart();
                sync(&ledger, events);
            }
            controller.set_autoplay(true);

            let mut elapsed = 0.0;
            let mut hits = 0;
            while controller.session().is_playing() {
                let events = controller.tick(FRAME_MS);
                elapsed += FRAME_MS;
                hits += events
                    .iter()
                    .filter(|e| matches!(e, GameEvent::Hit { .. }))
                    .count();
                sync(&ledger, events);

                if elapsed >= RUN_LIMIT_MS && controller.autoplay() {
                    controller.set_autoplay(false);
                }
                // Autoplay never misses, so the run ends on a deliberate late tap
                if !controller.autoplay()
                    && controller.is_tap_armed()
                    && marker_off_target(&controller)
                {
                    let events = controller.tap();
                    sync(&ledger, events);
                }
            }

            let session = controller.session();
            log::info!(
                "Run {}: score {} from {} hits, final speed {:.2}, {:.1}s",
                run,
                session.score,
                hits,
                session.speed,
                elapsed / 1000.0
            );
        }

        let ledger_total = ledger
            .entry(DEMO_WALLET)
            .map(|entry| entry.record.total_points)
            .unwrap_or(0);
        log::info!(
            "Best score {}, ledger total {} ({} scoring)",
            controller.high_score(),
            ledger_total,
            controller.scoring().as_str()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = match std::env::args().nth(1) {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring non-numeric seed {:?}", arg);
            demo::DEFAULT_SEED
        }),
        None => demo::DEFAULT_SEED,
    };

    // Optional second argument picks the scoring model
    let scoring = std::env::args()
        .nth(2)
        .and_then(|arg| match arg.parse::<one_tap::sim::ScoringMode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                log::warn!("Ignoring {}", e);
                None
            }
        });

    log::info!("One Tap Too Late (native) headless demo, seed {}", seed);
    demo::run(seed, scoring);
}
