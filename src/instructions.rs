//! Plain-text assembly guide for a patch.
//!
//! The guide lists the bill of materials, module placement per board (left to
//! right), every cable with 1-based board/module positions, and the control
//! settings to dial in.

use std::fmt;

use crate::catalog::ModuleCatalog;
use crate::model::{BoardId, ModuleInstance, Patch, PinId};

const RULE: &str = "===============================================";

/// Render the assembly guide for `patch`, optionally titled.
pub fn generate_instructions(patch: &Patch, catalog: &ModuleCatalog, title: Option<&str>) -> String {
    AssemblyGuide { patch, catalog, title }.to_string()
}

/// Display adapter producing the assembly guide.
pub struct AssemblyGuide<'a> {
    pub patch: &'a Patch,
    pub catalog: &'a ModuleCatalog,
    pub title: Option<&'a str>,
}

impl AssemblyGuide<'_> {
    fn module_name<'m>(&'m self, module: &'m ModuleInstance) -> &'m str {
        self.catalog
            .get(&module.module_type)
            .map(|meta| meta.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&module.module_type)
    }

    /// Modules of a board sorted left to right.
    fn board_modules(&self, board: &BoardId) -> Vec<&ModuleInstance> {
        let mut modules: Vec<&ModuleInstance> = self.patch.modules_on(board).collect();
        modules.sort_by_key(|m| m.x);
        modules
    }

    /// `Breadboard N, module M (Name) - Title.K (INPUT)` for one cable end.
    fn describe_end(&self, pin: &PinId) -> Option<String> {
        let module = self.patch.module(&pin.module)?;
        let board_index = self.patch.boards.iter().position(|b| b.id == module.board_id)?;
        let position = self
            .board_modules(&module.board_id)
            .iter()
            .position(|m| m.id == module.id)?;
        Some(format!(
            "Breadboard {}, module {} ({}) - {}",
            board_index + 1,
            position + 1,
            self.module_name(module),
            pin_label(module, pin)
        ))
    }

    fn write_bill_of_materials(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== BILL OF MATERIALS ===\n")?;

        writeln!(f, "BREADBOARDS:")?;
        for (board_type, count) in tally(self.patch.boards.iter().map(|b| b.board_type.as_str())) {
            writeln!(f, "  {count}x {board_type}")?;
        }
        writeln!(f)?;

        writeln!(f, "MODULES:")?;
        for (name, count) in tally(self.patch.modules.iter().map(|m| self.module_name(m))) {
            writeln!(f, "  {count}x {name}")?;
        }
        writeln!(f)?;

        writeln!(f, "PATCH CABLES: {}\n", self.patch.cables.len())
    }

    fn write_placement(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== MODULE PLACEMENT ===\n")?;
        for (index, board) in self.patch.boards.iter().enumerate() {
            let modules = self.board_modules(&board.id);
            if modules.is_empty() {
                continue;
            }
            writeln!(f, "BREADBOARD {}:", index + 1)?;
            for (i, module) in modules.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, self.module_name(module))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_connections(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== CABLE CONNECTIONS ===\n")?;
        if self.patch.cables.is_empty() {
            return writeln!(f, "No cables to connect.\n");
        }
        for (i, cable) in self.patch.cables.iter().enumerate() {
            let (Some(from), Some(to)) = (self.describe_end(&cable.from), self.describe_end(&cable.to)) else {
                continue;
            };
            writeln!(f, "  {}. {from}", i + 1)?;
            writeln!(f, "     ->  {to}\n")?;
        }
        Ok(())
    }

    fn write_controls(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== CONTROL SETTINGS ===\n")?;
        let mut any = false;
        for (index, board) in self.patch.boards.iter().enumerate() {
            let modules = self.board_modules(&board.id);
            let mut with_controls = modules
                .iter()
                .enumerate()
                .filter(|(_, m)| !m.knobs.is_empty() || !m.switches.is_empty())
                .peekable();
            if with_controls.peek().is_none() {
                continue;
            }
            any = true;
            writeln!(f, "BREADBOARD {}:", index + 1)?;
            for (position, module) in with_controls {
                writeln!(f, "  Module {} ({}):", position + 1, self.module_name(module))?;
                for (k, knob) in module.knobs.iter().enumerate() {
                    let percent = (knob.value * 100.0).round() as i32;
                    if knob.title.is_empty() {
                        writeln!(f, "    Knob {}: {percent}%", k + 1)?;
                    } else {
                        writeln!(f, "    {}: {percent}%", knob.title)?;
                    }
                }
                for (s, switch) in module.switches.iter().enumerate() {
                    let state = if switch.value { "ON" } else { "OFF" };
                    if switch.title.is_empty() {
                        writeln!(f, "    Switch {}: {state}", s + 1)?;
                    } else {
                        writeln!(f, "    {}: {state}", switch.title)?;
                    }
                }
                writeln!(f)?;
            }
        }
        if !any {
            writeln!(f, "No controls to adjust.\n")?;
        }
        Ok(())
    }
}

impl fmt::Display for AssemblyGuide<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        if let Some(title) = self.title {
            writeln!(f, "           {}", title.to_uppercase())?;
        }
        writeln!(f, "           MICROPATCH ASSEMBLY GUIDE")?;
        writeln!(f, "{RULE}\n")?;

        self.write_bill_of_materials(f)?;
        self.write_placement(f)?;
        self.write_connections(f)?;
        self.write_controls(f)?;

        writeln!(f, "{RULE}")?;
        writeln!(f, "              END OF INSTRUCTIONS")?;
        writeln!(f, "{RULE}")
    }
}

/// Human label of a pin: `Title.N (INPUT)` with a 1-based sub-pin number.
fn pin_label(module: &ModuleInstance, pin: &PinId) -> String {
    let io = pin.io.as_str();
    let Some(group) = module.groups(pin.io).get(pin.group) else {
        return format!("{io}.{}", pin.pin);
    };
    let title = if group.title.is_empty() {
        format!("{io}.{}", pin.group)
    } else {
        group.title.clone()
    };
    format!("{title}.{} ({})", pin.pin + 1, io.to_uppercase())
}

/// Count occurrences, keeping first-seen order.
fn tally<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(name, _)| *name == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}
