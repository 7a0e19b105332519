use fnv::FnvHashMap;

/// A ground value in the rule layer: an integer (topology vertices are integers too) or an
/// interned identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramSymbol {
    Int(i64),
    Id(IdentifierId),
}

impl ProgramSymbol {
    pub(crate) fn as_int(self) -> Option<i64> {
        match self {
            ProgramSymbol::Int(value) => Some(value),
            ProgramSymbol::Id(_) => None,
        }
    }
}

/// An interned identifier constant; scoped to one program, not process-global.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentifierId(pub(crate) u32);

#[derive(Debug, Default, Clone)]
pub(crate) struct IdentifierInterner {
    names: Vec<String>,
    map: FnvHashMap<String, u32>,
}

impl IdentifierInterner {
    pub(crate) fn intern(&mut self, name: &str) -> IdentifierId {
        if let Some(&existing) = self.map.get(name) {
            return IdentifierId(existing);
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_owned());
        let _ = self.map.insert(name.to_owned(), id);
        IdentifierId(id)
    }

    pub(crate) fn name(&self, id: IdentifierId) -> &str {
        &self.names[id.0 as usize]
    }

    pub(crate) fn format_symbol(&self, symbol: ProgramSymbol) -> String {
        match symbol {
            ProgramSymbol::Int(value) => value.to_string(),
            ProgramSymbol::Id(id) => self.name(id).to_owned(),
        }
    }
}
