use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use traffic_signals::simulation::demo::build_crossroads;
use traffic_signals::simulation::{
    AppliedState, Animator, DirectSink, ElementPosition, Intersection, IntersectionRegistry, LightPhase,
    ManualClock, MemoryWorld, PhaseLights, SignalAspect, SignalConfig, SignalService, SystemClock, TickReport,
    MILLIS_PER_TICK,
};

#[derive(Parser)]
#[command(name = "traffic_signals")]
#[command(about = "Traffic signal animator running against an in-memory world")]
struct Cli {
    /// Number of game ticks to simulate in headless mode
    #[arg(long, default_value = "1200")]
    ticks: u32,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of intersection records (JSON); a demo crossroads is built when omitted
    #[arg(long)]
    intersections: Option<PathBuf>,

    /// Override animation.tick-interval from the configuration
    #[arg(long)]
    tick_interval: Option<u32>,

    /// Seed for the random region unloading
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Chance per simulated second that a region is unloaded (0 disables)
    #[arg(long, default_value = "0.0")]
    unload_chance: f64,

    /// Run the threaded service in real time instead of the headless loop
    #[arg(long)]
    threaded: bool,

    /// Real seconds to run in threaded mode
    #[arg(long, default_value = "5")]
    seconds: u64,

    /// Pause between printed seconds in headless mode
    #[arg(long, default_value = "0")]
    delay_ms: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SignalConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SignalConfig::default(),
    };
    if let Some(interval) = cli.tick_interval {
        config.animation.tick_interval = interval;
        config.validate()?;
    }

    let default_filter = if config.debug {
        "warn,traffic_signals=debug"
    } else {
        "warn,traffic_signals=info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut world = MemoryWorld::new();
    let registry = match &cli.intersections {
        Some(dir) => IntersectionRegistry::load_dir(dir)?,
        None => {
            let mut registry = IntersectionRegistry::new();
            registry.register(build_crossroads(&mut world, "Main & First", 0, 0));
            registry
        }
    };

    if cli.threaded {
        run_threaded(&cli, config, registry, world)
    } else {
        run_headless(&cli, config, registry, world);
        Ok(())
    }
}

/// Run the animator in headless mode on a simulated clock
fn run_headless(cli: &Cli, config: SignalConfig, registry: IntersectionRegistry, mut world: MemoryWorld) {
    println!("Running traffic signals in headless mode...");
    println!(
        "Ticks: {}, tick interval: {} ({} ms per tick)",
        cli.ticks, config.animation.tick_interval, MILLIS_PER_TICK
    );
    println!();

    let clock = Arc::new(ManualClock::new());
    let interval = config.animation.tick_interval;
    let mut animator = Animator::new(config, clock.clone());
    animator.start(registry.complete());
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let ticks_per_second = (1000 / MILLIS_PER_TICK) as u32;

    let mut totals = TickReport::default();
    let mut tick = 0;
    while tick < cli.ticks {
        let ticks_to_run = ticks_per_second.min(cli.ticks - tick);

        for _ in 0..ticks_to_run {
            if tick % interval == 0 {
                let report = animator.tick(&mut DirectSink::new(&mut world));
                accumulate(&mut totals, &report);
            }
            tick += 1;
            clock.advance_ticks(1);
        }

        if cli.unload_chance > 0.0 {
            unload_regions(&mut world, &animator, &mut rng, cli.unload_chance);
        }

        println!("--- After tick {} ({:.1}s simulated time) ---", tick, f64::from(tick) * 0.05);
        print_summary(&animator, &world);
        draw_map(&animator);
        println!();

        if cli.delay_ms > 0 && tick < cli.ticks {
            std::thread::sleep(Duration::from_millis(cli.delay_ms));
        }
    }

    println!("=== Final State ===");
    print_summary(&animator, &world);
    print_totals(&totals, &world);
    info!("SIGNAL RUN COMPLETE: {} ticks, {} writes", tick, totals.writes);
}

/// Run the threaded service against the world for a few real seconds
fn run_threaded(cli: &Cli, config: SignalConfig, registry: IntersectionRegistry, mut world: MemoryWorld) -> Result<()> {
    println!("Running traffic signals on the driver thread for {}s...", cli.seconds);
    let mut service = match &cli.config {
        Some(path) => SignalService::from_config_file(path, Arc::new(SystemClock::new()), registry)?,
        None => SignalService::new(config, Arc::new(SystemClock::new()), registry),
    };
    if let Some(interval) = cli.tick_interval {
        let mut config = service.config();
        config.animation.tick_interval = interval;
        service.apply_config(config);
    }
    service.start();

    let deadline = Instant::now() + Duration::from_secs(cli.seconds);
    let mut executed = 0;
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(MILLIS_PER_TICK));
        executed += service.pump_world(&mut world);
    }

    service.stop();
    println!("=== Final State ===");
    println!("Writes executed on the world thread: {}", executed);
    println!(
        "World: {} cell writes, {} object writes, {} spawns",
        world.stats.cell_writes, world.stats.object_writes, world.stats.spawns
    );
    info!("SIGNAL RUN COMPLETE: {} writes", executed);
    Ok(())
}

fn accumulate(totals: &mut TickReport, report: &TickReport) {
    totals.transitions += report.transitions;
    totals.writes += report.writes;
    totals.unchanged += report.unchanged;
    totals.skipped += report.skipped;
    totals.failed += report.failed;
    totals.frozen += report.frozen;
}

/// Unload each region holding a light with the given chance, reload the others
fn unload_regions(world: &mut MemoryWorld, animator: &Animator, rng: &mut StdRng, chance: f64) {
    let mut regions: Vec<_> = animator
        .intersections()
        .flat_map(|i| i.all_positions())
        .map(|p| p.region())
        .collect();
    regions.sort_by_key(|r| (r.world.clone(), r.x, r.z));
    regions.dedup();

    for region in regions {
        let active = !rng.random_bool(chance.clamp(0.0, 1.0));
        world.set_region_active(region, active);
    }
}

fn print_summary(animator: &Animator, world: &MemoryWorld) {
    println!("=== Traffic Signal Summary ===");
    println!(
        "Intersections: {}, cached lights: {}, unloaded regions: {}",
        animator.active_cycle_count(),
        animator.cached_position_count(),
        world.inactive_region_count()
    );

    let mut intersections: Vec<&Arc<Intersection>> = animator.intersections().collect();
    intersections.sort_by(|a, b| a.name.cmp(&b.name));
    for intersection in intersections {
        if let Some(cycle) = animator.cycle(&intersection.id) {
            let phase = cycle.current_phase();
            println!(
                "  {}: phase {}/{} (group {} {}), walk window {}",
                intersection.name,
                phase.phase_index,
                cycle.total_sub_phases(),
                phase.active_group,
                phase.active_light(),
                if phase.walk_open { "open" } else { "closed" }
            );
        }
    }
}

/// What a side currently shows, as one letter
fn side_letter(animator: &Animator, intersection: &Intersection, index: usize) -> char {
    let side = &intersection.sides[index];
    for phase in LightPhase::ALL {
        let position = match side.lights_for(phase) {
            PhaseLights::Elements(elements) => elements.first().map(|e| e.position()),
            PhaseLights::Cells(cells) => cells.first().cloned().map(ElementPosition::Cell),
            PhaseLights::None => None,
        };
        let lit = position
            .and_then(|p| animator.applied_state(&p))
            .is_some_and(|state| state == AppliedState::Lit(SignalAspect::Vehicle(phase)));
        if lit {
            return match phase {
                LightPhase::Red => 'R',
                LightPhase::Orange => 'O',
                LightPhase::Green => 'G',
            };
        }
    }
    '?'
}

/// Draw each intersection as a small cross with one letter per approach
fn draw_map(animator: &Animator) {
    let mut intersections: Vec<&Arc<Intersection>> = animator.intersections().collect();
    intersections.sort_by(|a, b| a.name.cmp(&b.name));

    for intersection in intersections {
        let letter_for = |label: &str| {
            intersection
                .sides
                .iter()
                .position(|s| s.direction.eq_ignore_ascii_case(label))
                .map(|index| side_letter(animator, intersection, index))
                .unwrap_or(' ')
        };
        println!("      {}", letter_for("North"));
        println!("      |");
        println!("  {} --+-- {}", letter_for("West"), letter_for("East"));
        println!("      |");
        println!("      {}", letter_for("South"));
    }
}

fn print_totals(totals: &TickReport, world: &MemoryWorld) {
    println!("--- Totals ---");
    println!(
        "  transitions={}, writes={}, unchanged={}, skipped={}, failed={}, frozen={}",
        totals.transitions, totals.writes, totals.unchanged, totals.skipped, totals.failed, totals.frozen
    );
    println!(
        "  world: cell_writes={}, object_writes={}, spawns={}, dropped_content={}",
        world.stats.cell_writes, world.stats.object_writes, world.stats.spawns, world.stats.dropped_content
    );
}
