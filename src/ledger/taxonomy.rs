//! The fixed two-level category taxonomy entries are recorded under.

use crate::Error;

/// An ordered list of categories, each with its subcategories.
///
/// The taxonomy is configuration: build it once at startup and share it
/// through the app state.
#[derive(Debug, Clone, PartialEq)]
pub struct Taxonomy {
    categories: Vec<(String, Vec<String>)>,
}

impl Taxonomy {
    /// Create a taxonomy from `(category, subcategories)` pairs.
    ///
    /// The order of the pairs is the order categories are listed in forms.
    pub fn new<C, S>(categories: impl IntoIterator<Item = (C, Vec<S>)>) -> Self
    where
        C: Into<String>,
        S: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|(category, subcategories)| {
                    (
                        category.into(),
                        subcategories.into_iter().map(Into::into).collect(),
                    )
                })
                .collect(),
        }
    }

    /// The names of the top-level categories in display order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(category, _)| category.as_str())
    }

    /// The subcategories of `category`, or `None` if the category does not exist.
    pub fn subcategories(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, subcategories)| subcategories.as_slice())
    }

    /// Check that `subcategory` belongs to `category`.
    ///
    /// # Errors
    /// Returns [Error::UnknownCategory] if the category does not exist, or
    /// [Error::UnknownSubcategory] if the subcategory is not listed under it.
    pub fn validate(&self, category: &str, subcategory: &str) -> Result<(), Error> {
        let subcategories = self
            .subcategories(category)
            .ok_or_else(|| Error::UnknownCategory(category.to_owned()))?;

        if subcategories.iter().any(|name| name == subcategory) {
            Ok(())
        } else {
            Err(Error::UnknownSubcategory {
                category: category.to_owned(),
                subcategory: subcategory.to_owned(),
            })
        }
    }
}

impl Default for Taxonomy {
    /// The household budget categories the app ships with.
    fn default() -> Self {
        Self::new([
            (
                "Renda Familiar",
                vec!["Salários", "Horas extras", "13º Salário", "Férias", "Outros"],
            ),
            (
                "Habitação",
                vec![
                    "Aluguel",
                    "IPTU",
                    "Água",
                    "Luz",
                    "Telefones",
                    "TV por Assinatura",
                    "Reformas/Consertos",
                    "Outros",
                    "Prestação",
                ],
            ),
            (
                "Saúde",
                vec![
                    "Plano de Saúde",
                    "Médico",
                    "Dentista",
                    "Medicamentos",
                    "Seguro de Vida",
                    "Outros",
                ],
            ),
            ("Transporte", vec!["Ônibus", "Táxi", "Outros"]),
            (
                "Automóvel",
                vec![
                    "Prestação",
                    "IPVA",
                    "Combustível",
                    "Lavagens",
                    "Seguro",
                    "Manutenção",
                    "Multas",
                    "Outros",
                ],
            ),
            (
                "Despesas Pessoais",
                vec![
                    "Alimentação",
                    "Higiene Pessoal",
                    "Cosméticos",
                    "Cabeleireiro",
                    "Vestuário",
                    "Lavanderia",
                    "Academia",
                    "Cursos",
                    "Outros",
                ],
            ),
            (
                "Lazer",
                vec![
                    "Restaurantes",
                    "Cafés/Bares/Boates",
                    "Locadora de Vídeo",
                    "CDs/Acessórios",
                    "Cinema",
                    "Passagens",
                    "Hotéis",
                    "Livros/Revistas",
                    "Outros",
                ],
            ),
            ("Cartões de Crédito", vec!["MasterCard", "Visa", "Outros"]),
            (
                "Dependentes",
                vec![
                    "Escola/Faculdade",
                    "Cursos Extras",
                    "Material escolar",
                    "Esportes/Uniformes",
                    "Mesada",
                    "Passeios/Férias",
                    "Vestuário",
                    "Saúde/Medicamentos",
                    "Outros",
                ],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, ledger::Taxonomy};

    #[test]
    fn default_taxonomy_has_nine_categories_in_order() {
        let taxonomy = Taxonomy::default();

        let categories: Vec<&str> = taxonomy.categories().collect();

        assert_eq!(categories.len(), 9);
        assert_eq!(categories.first(), Some(&"Renda Familiar"));
        assert_eq!(categories.last(), Some(&"Dependentes"));
    }

    #[test]
    fn subcategories_of_known_category() {
        let taxonomy = Taxonomy::default();

        let subcategories = taxonomy.subcategories("Transporte").unwrap();

        assert_eq!(subcategories, ["Ônibus", "Táxi", "Outros"]);
    }

    #[test]
    fn subcategories_of_unknown_category_is_none() {
        assert_eq!(Taxonomy::default().subcategories("Foo"), None);
    }

    #[test]
    fn validate_accepts_matching_pair() {
        assert_eq!(
            Taxonomy::default().validate("Automóvel", "Combustível"),
            Ok(())
        );
    }

    #[test]
    fn validate_rejects_unknown_category() {
        assert_eq!(
            Taxonomy::default().validate("Foo", "Outros"),
            Err(Error::UnknownCategory("Foo".to_owned()))
        );
    }

    #[test]
    fn validate_rejects_subcategory_from_other_category() {
        assert_eq!(
            Taxonomy::default().validate("Transporte", "IPVA"),
            Err(Error::UnknownSubcategory {
                category: "Transporte".to_owned(),
                subcategory: "IPVA".to_owned(),
            })
        );
    }
}
