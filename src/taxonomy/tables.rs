use super::AliasTable;
use crate::model::FuelCode;

/// Alias tables for every configured country namespace.
pub fn builtin_tables() -> Vec<AliasTable> {
    vec![france(), denmark(), sweden(), norway(), netherlands(), china()]
}

fn france() -> AliasTable {
    AliasTable::new("fr")
        .with(FuelCode::Bev, &["électrique", "electrique", "elec", "100% électrique"])
        .with(
            FuelCode::Phev,
            &[
                "hybride rechargeable",
                "hybride rechargeable essence",
                "hybride rechargeable gazole",
                "phev",
            ],
        )
        .with(FuelCode::Hybrid, &["hybride", "hybride non rechargeable", "hev"])
        .with(FuelCode::Diesel, &["gazole", "diesel"])
        .with(FuelCode::Gasoline, &["essence", "super"])
        .with(
            FuelCode::LpgCngOther,
            &["gpl", "gnv", "gaz", "bicarburation", "superéthanol", "e85"],
        )
        .with(FuelCode::Other, &["hydrogène", "autres énergies"])
}

fn denmark() -> AliasTable {
    AliasTable::new("dk")
        .with(FuelCode::Bev, &["el", "elbiler", "elektrisk"])
        .with(FuelCode::Phev, &["plug-in hybrid", "pluginhybrid", "plug-in hybrider"])
        .with(FuelCode::Hybrid, &["hybrid", "hybrider"])
        .with(FuelCode::Diesel, &["diesel"])
        .with(FuelCode::Gasoline, &["benzin"])
        .with(FuelCode::LpgCngOther, &["gas", "naturgas"])
}

fn sweden() -> AliasTable {
    AliasTable::new("se")
        .with(FuelCode::Bev, &["el"])
        .with(FuelCode::Phev, &["laddhybrid", "laddbar hybrid"])
        .with(FuelCode::Hybrid, &["elhybrid", "hybrid"])
        .with(FuelCode::Diesel, &["diesel"])
        .with(FuelCode::Gasoline, &["bensin"])
        .with(
            FuelCode::LpgCngOther,
            &["etanol/etanol flexifuel", "etanol", "gas/gas flexifuel", "gas"],
        )
        .with(FuelCode::Other, &["övriga bränslen"])
}

fn norway() -> AliasTable {
    AliasTable::new("no")
        .with(FuelCode::Bev, &["elektrisk", "el"])
        .with(FuelCode::Phev, &["ladbar hybrid", "plug-in hybrid"])
        .with(FuelCode::Hybrid, &["hybrid"])
        .with(FuelCode::Diesel, &["diesel"])
        .with(FuelCode::Gasoline, &["bensin"])
        .with(FuelCode::LpgCngOther, &["gass", "parafin"])
        .with(FuelCode::Other, &["hydrogen", "annet drivstoff"])
}

fn netherlands() -> AliasTable {
    AliasTable::new("nl")
        .with(FuelCode::Bev, &["elektriciteit"])
        .with(FuelCode::Phev, &["ovc-hev"])
        .with(
            FuelCode::Hybrid,
            &["novc-hev", "benzine elektriciteit", "diesel elektriciteit"],
        )
        .with(FuelCode::Diesel, &["diesel"])
        .with(FuelCode::Gasoline, &["benzine"])
        .with(FuelCode::LpgCngOther, &["lpg", "cng", "lng", "alcohol"])
        .with(FuelCode::Other, &["waterstof"])
}

fn china() -> AliasTable {
    AliasTable::new("cn")
        .with(FuelCode::Bev, &["纯电动", "bev"])
        .with(FuelCode::Phev, &["插电式混合动力", "phev"])
        .with(FuelCode::Hybrid, &["hev"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_aliases_resolve_to_the_specific_code() {
        assert_eq!(netherlands().normalize("NOVC-HEV"), FuelCode::Hybrid);
        assert_eq!(netherlands().normalize("OVC-HEV"), FuelCode::Phev);
        assert_eq!(france().normalize("Superéthanol E85"), FuelCode::LpgCngOther);
        assert_eq!(sweden().normalize("Diesel"), FuelCode::Diesel);
        assert_eq!(denmark().normalize("Plug-in hybrid"), FuelCode::Phev);
        assert_eq!(china().normalize("PHEV"), FuelCode::Phev);
    }
}
