use std::io::{self, Write};

use log::debug;

use crate::cache::{AccessOutcome, CacheLevel};
use crate::io::Command;
use crate::simulator::{Simulator, Stats};
use crate::vm_manager::LoadOutcome;

pub const HELP: &str = "\
Supported commands:
  init memory <size>
  alloc <size> | malloc <size>
  free <id> | free addr <address>
  show | dump memory
  dump pages | dump tlb | dump cache
  stats | stats json
  strategy first|best|worst
  policy fifo|lru
  load <page>
  translate <virtual_address>
  exit
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOptions {
    /// Repeat each input line after the prompt (script mode)
    pub echo: bool,
    /// No banner, no prompt
    pub quiet: bool,
}

/// Line-oriented driver around a `Simulator`
pub struct Console {
    sim: Simulator,
    options: ConsoleOptions,
}

impl Console {
    pub fn new(sim: Simulator, options: ConsoleOptions) -> Self {
        Console { sim, options }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    /// Read commands until `exit` or end of input.
    pub fn run<I, W>(&mut self, lines: I, out: &mut W) -> io::Result<()>
    where
        I: IntoIterator<Item = io::Result<String>>,
        W: Write,
    {
        if !self.options.quiet {
            writeln!(out, "Memory Management Simulator")?;
            writeln!(out, "Type 'help' to see commands.")?;
        }

        let mut lines = lines.into_iter();
        loop {
            if !self.options.quiet {
                write!(out, ">> ")?;
                out.flush()?;
            }

            let Some(line) = lines.next().transpose()? else {
                writeln!(out)?;
                writeln!(out, "Exiting simulator.")?;
                return Ok(());
            };
            if self.options.echo && !self.options.quiet {
                writeln!(out, "{}", line)?;
            }

            if self.handle_line(&line, out)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Parse and execute one line, reporting any error to `out`.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command, out),
            Ok(None) => Ok(Flow::Continue),
            Err(err) => {
                writeln!(out, "{}", err)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<Flow> {
        debug!("executing {:?}", command);
        let sim = &mut self.sim;

        let result = match command {
            Command::Exit => {
                writeln!(out, "Exiting simulator.")?;
                return Ok(Flow::Exit);
            }
            Command::Help => Ok(write!(out, "{}", HELP)),
            Command::InitMemory(size) => sim
                .init_heap(size)
                .map(|()| writeln!(out, "Initialized memory with size {} bytes.", size)),
            Command::Alloc(size) => sim.allocate(size).map(|a| {
                writeln!(
                    out,
                    "Allocated {} bytes at address 0x{:04x} (id={}).",
                    a.size, a.start, a.id
                )
            }),
            Command::Free(id) => sim.free_by_id(id).map(|()| writeln!(out, "Block {} freed.", id)),
            Command::FreeAddr(address) => sim
                .free_by_address(address)
                .map(|()| writeln!(out, "Block at address {} freed.", address)),
            Command::Strategy(name) => sim
                .set_allocation_strategy(&name)
                .map(|strategy| writeln!(out, "Strategy set to {}.", strategy)),
            Command::Policy(name) => sim
                .set_eviction_policy(&name)
                .map(|policy| writeln!(out, "Replacement policy: {}", policy)),
            Command::Load(page) => sim.load_page(page).map(|outcome| write_load(out, outcome)),
            Command::Translate(va) => sim.translate(va).map(|t| {
                let tlb = if t.tlb_hit { "TLB hit" } else { "TLB miss" };
                let cache = match t.cache {
                    AccessOutcome::L1Hit => "L1 hit",
                    AccessOutcome::L2Hit => "L2 hit",
                    AccessOutcome::Miss => "cache miss",
                };
                writeln!(
                    out,
                    "Virtual Address {} -> Physical Address {} ({}, {})",
                    t.va.va, t.physical, tlb, cache
                )
            }),
            Command::DumpMemory => Ok(write_heap_dump(out, sim)),
            Command::DumpPages => Ok(write_pages(out, sim)),
            Command::DumpTlb => Ok(write_tlb(out, sim)),
            Command::DumpCache => Ok(write_caches(out, sim)),
            Command::Stats => Ok(write_stats(out, &sim.stats())),
            Command::StatsJson => Ok(serde_json::to_string_pretty(&sim.stats())
                .map_err(io::Error::other)
                .and_then(|json| writeln!(out, "{}", json))),
        };

        match result {
            Ok(written) => written?,
            Err(err) => writeln!(out, "Error: {}", err)?,
        }
        Ok(Flow::Continue)
    }
}

fn write_load<W: Write>(out: &mut W, outcome: LoadOutcome) -> io::Result<()> {
    match outcome {
        LoadOutcome::Loaded { page, frame } => {
            writeln!(out, "Page {} loaded into memory (frame {}).", page, frame)
        }
        LoadOutcome::Replaced { page, frame, victim } => {
            writeln!(out, "Evicted page {}.", victim)?;
            writeln!(out, "Page {} loaded into memory (frame {}).", page, frame)
        }
        LoadOutcome::AlreadyResident { page, frame } => {
            writeln!(out, "Page {} already in memory (frame {}).", page, frame)
        }
    }
}

fn write_heap_dump<W: Write>(out: &mut W, sim: &Simulator) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Memory Dump:")?;
    for block in sim.dump_heap() {
        writeln!(out, "{}", block)?;
    }
    writeln!(out)
}

fn write_pages<W: Write>(out: &mut W, sim: &Simulator) -> io::Result<()> {
    let vm = sim.vm();
    writeln!(
        out,
        "Resident pages ({} frames free, clock {}):",
        vm.frames().free_count(),
        vm.clock().now()
    )?;
    for (page, frame) in vm.page_table().resident() {
        let last_used = vm.recency().get(page).unwrap_or_default();
        writeln!(out, "  page {:>2} -> frame {:>2} (last used {})", page, frame, last_used)?;
    }

    let fifo = vm.fifo();
    if fifo.is_empty() {
        return writeln!(out, "FIFO order: empty");
    }
    let order: Vec<String> = fifo.iter().map(|page| page.to_string()).collect();
    writeln!(out, "FIFO order ({} slots): {}", fifo.len(), order.join(" "))
}

fn write_tlb<W: Write>(out: &mut W, sim: &Simulator) -> io::Result<()> {
    let tlb = sim.vm().tlb();
    writeln!(out, "TLB:")?;
    for (slot, entry) in tlb.entries().iter().enumerate() {
        let marker = if slot == tlb.cursor() { "*" } else { " " };
        if entry.valid {
            writeln!(out, " {}[{}] page {:>2} -> frame {:>2}", marker, slot, entry.page, entry.frame)?;
        } else {
            writeln!(out, " {}[{}] empty", marker, slot)?;
        }
    }
    Ok(())
}

fn write_caches<W: Write>(out: &mut W, sim: &Simulator) -> io::Result<()> {
    let caches = sim.vm().caches();
    write_cache_level(out, caches.l1())?;
    write_cache_level(out, caches.l2())
}

fn write_cache_level<W: Write>(out: &mut W, level: &CacheLevel) -> io::Result<()> {
    writeln!(out, "{} ({} lines):", level.name(), level.lines().len())?;
    for (index, line) in level.lines().iter().enumerate().filter(|(_, l)| l.valid) {
        writeln!(out, "  line {:>2}: tag {}", index, line.tag)?;
    }
    Ok(())
}

fn write_stats<W: Write>(out: &mut W, stats: &Stats) -> io::Result<()> {
    let heap = &stats.heap;
    writeln!(out)?;
    writeln!(out, "--- Memory Statistics ---")?;
    writeln!(out, "Strategy: {}", stats.strategy)?;
    writeln!(out, "Total memory: {} bytes", heap.total)?;
    writeln!(out, "Used memory: {} bytes", heap.used)?;
    writeln!(out, "Free memory: {} bytes", heap.free)?;
    writeln!(out, "Largest free block: {} bytes", heap.largest_free)?;
    writeln!(out, "Memory utilization: {:.2}%", heap.utilization_pct)?;
    writeln!(out, "External fragmentation: {:.2}%", heap.external_fragmentation_pct)?;
    writeln!(out, "Internal fragmentation: {:.2}%", heap.internal_fragmentation_pct)?;
    writeln!(out, "Allocation requests: {}", heap.counters.requests)?;
    writeln!(out, "Successful allocations: {}", heap.counters.successes)?;
    writeln!(out, "Failed allocations: {}", heap.counters.failures)?;

    let vm = &stats.translation;
    writeln!(out)?;
    writeln!(out, "--- Virtual Memory Statistics ---")?;
    writeln!(out, "Policy: {}", stats.policy)?;
    writeln!(out, "TLB Hits: {}", vm.tlb_hits)?;
    writeln!(out, "TLB Misses: {}", vm.tlb_misses)?;
    writeln!(out, "Page Faults: {}", vm.page_faults)?;
    writeln!(out, "Page Loads: {}", vm.page_loads)?;
    writeln!(out, "Evictions: {}", vm.evictions)?;
    writeln!(out, "Resident Pages: {}", stats.resident_pages)?;

    writeln!(out)?;
    writeln!(out, "--- Cache Statistics ---")?;
    writeln!(out, "L1 Hits: {}", stats.l1.hits)?;
    writeln!(out, "L1 Misses: {}", stats.l1.misses)?;
    writeln!(out, "L1 Hit Rate: {:.2}%", stats.l1.hit_rate())?;
    writeln!(out, "L2 Hits: {}", stats.l2.hits)?;
    writeln!(out, "L2 Misses: {}", stats.l2.misses)?;
    writeln!(out, "L2 Hit Rate: {:.2}%", stats.l2.hit_rate())
}
