use std::sync::{Arc, RwLock};

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::Schedule;

pub mod catalog;
pub mod commands;
pub mod diversity;
pub mod observer;
pub mod resources;
pub mod session;
pub mod simulator;
pub mod systems;

pub use catalog::*;
pub use commands::*;
pub use diversity::{DiversitySample, DiversitySeries, diversity_series, shannon, simpson};
pub use observer::*;
pub use resources::*;
pub use session::*;
pub use simulator::*;
pub use systems::*;

/// Owns the session and selection as ECS resources and applies queued commands.
pub struct StudioWorld {
    world: World,
    schedule: Schedule,
    observer: Arc<RwLock<ObserverSnapshot>>,
}

impl StudioWorld {
    pub fn new(config: StudioConfig) -> Self {
        Self::with_observer(config, Arc::new(RwLock::new(ObserverSnapshot::default())))
    }

    pub fn with_observer(config: StudioConfig, observer: Arc<RwLock<ObserverSnapshot>>) -> Self {
        Self::with_noise(config, observer, Box::new(EntropyNoise::new()))
    }

    pub fn with_noise(
        config: StudioConfig,
        observer: Arc<RwLock<ObserverSnapshot>>,
        noise: Box<dyn NoiseSource + Send + Sync>,
    ) -> Self {
        let mut world = World::default();
        world.insert_resource(PhaseSelection::new(&config));
        world.insert_resource(PhaseJournal::new(config.journal_capacity));
        world.insert_resource(config);
        world.insert_resource(Session::new());
        world.insert_resource(CommandQueue::default());
        world.insert_resource(StudioStatus::default());
        world.insert_resource(StudioNoise(noise));

        let mut schedule = Schedule::default();
        schedule.add_systems((command_system, phase_logging_system).chain());

        let mut studio = Self {
            world,
            schedule,
            observer,
        };
        studio.refresh_observer_snapshot();
        studio
    }

    pub fn observer(&self) -> Arc<RwLock<ObserverSnapshot>> {
        self.observer.clone()
    }

    /// Queues a command for the next [`StudioWorld::tick`].
    pub fn submit(&mut self, command: StudioCommand) {
        self.world.resource_mut::<CommandQueue>().push(command);
    }

    /// Queues and immediately processes one command.
    pub fn apply(&mut self, command: StudioCommand) -> Option<String> {
        self.submit(command);
        self.tick();
        self.last_error()
    }

    pub fn tick(&mut self) {
        self.schedule.run(&mut self.world);
        self.refresh_observer_snapshot();
    }

    pub fn session(&self) -> &Session {
        self.world.resource::<Session>()
    }

    pub fn selection(&self) -> &PhaseSelection {
        self.world.resource::<PhaseSelection>()
    }

    pub fn last_error(&self) -> Option<String> {
        self.world.resource::<StudioStatus>().last_error.clone()
    }

    pub fn diversity(&self) -> DiversitySeries {
        diversity_series(self.session())
    }

    pub fn snapshot(&self) -> ObserverSnapshot {
        match self.observer.read() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn refresh_observer_snapshot(&mut self) {
        let revision = self.world.resource::<StudioStatus>().commands_processed;
        let last_error = self.last_error();
        let journal = self.world.resource::<PhaseJournal>().snapshot();
        let selection = self.world.resource::<PhaseSelection>();
        let session = self.world.resource::<Session>();

        if let Ok(mut snapshot) = self.observer.write() {
            snapshot.update(revision, selection, session, last_error, journal);
        }
    }
}
